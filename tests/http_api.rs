//! End-to-end tests for the HTTP surface, with the upstream replaced by a stub.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::{http::header, http::Method, http::StatusCode, test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};

use image_relay::{
    openrouter::ChatCompletionRequest, server, ImageClient, ImageUpstream, OpenRouterConfig,
    Result, UpstreamReply,
};

const ORIGIN: &str = "http://localhost:5173";

struct FixedUpstream {
    status: u16,
    body: String,
    calls: AtomicUsize,
}

impl FixedUpstream {
    fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageUpstream for FixedUpstream {
    async fn send(&self, _api_key: &str, _request: &ChatCompletionRequest) -> Result<UpstreamReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UpstreamReply::new(self.status, self.body.clone()))
    }
}

fn image_payload(url: &str) -> Value {
    json!({
        "id": "gen-123",
        "model": "google/gemini-2.5-flash-image-preview:free",
        "choices": [{
            "finish_reason": "stop",
            "message": {
                "role": "assistant",
                "content": "",
                "images": [{ "type": "image_url", "image_url": { "url": url } }]
            }
        }]
    })
}

fn client_with(upstream: Arc<FixedUpstream>, api_key: Option<&str>) -> ImageClient {
    let mut config = OpenRouterConfig::new();
    if let Some(key) = api_key {
        config = config.with_api_key(key);
    }
    ImageClient::with_upstream(&config, upstream)
}

macro_rules! app {
    ($client:expr) => {
        test::init_service(
            App::new()
                .wrap(server::build_cors(ORIGIN))
                .app_data(web::Data::new($client))
                .configure(server::configure),
        )
        .await
    };
}

fn generate(body: Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/generate-image")
        .insert_header((header::ORIGIN, ORIGIN))
        .set_json(body)
}

#[actix_web::test]
async fn returns_image_on_success() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/fox.png").to_string());
    let app = app!(client_with(upstream.clone(), Some("sk-or-test")));

    let resp = test::call_service(&app, generate(json!({ "prompt": "a fox" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "image": "https://cdn/fox.png" }));
    assert_eq!(upstream.calls(), 1);
}

#[actix_web::test]
async fn missing_key_returns_500_without_upstream_call() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/fox.png").to_string());
    let app = app!(client_with(upstream.clone(), None));

    let resp = test::call_service(&app, generate(json!({ "prompt": "a fox" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Missing OPENROUTER_API_KEY" }));
    assert_eq!(upstream.calls(), 0);
}

#[actix_web::test]
async fn non_json_upstream_returns_raw_text() {
    let upstream = FixedUpstream::new(200, "<!doctype html><p>maintenance</p>");
    let app = app!(client_with(upstream, Some("sk-or-test")));

    let resp = test::call_service(&app, generate(json!({ "prompt": "a fox" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Non-JSON response from OpenRouter");
    assert_eq!(body["raw"], "<!doctype html><p>maintenance</p>");
    assert!(body.get("image").is_none());
}

#[actix_web::test]
async fn upstream_status_is_propagated() {
    let upstream_body = json!({ "error": { "code": 429, "message": "Rate limit exceeded" } });
    let upstream = FixedUpstream::new(429, upstream_body.to_string());
    let app = app!(client_with(upstream, Some("sk-or-test")));

    let resp = test::call_service(&app, generate(json!({ "prompt": "a fox" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "error": "OpenRouter request failed", "info": upstream_body })
    );
}

#[actix_web::test]
async fn missing_image_returns_full_payload() {
    let payload = json!({ "choices": [{ "message": { "content": "text only" } }] });
    let upstream = FixedUpstream::new(200, payload.to_string());
    let app = app!(client_with(upstream, Some("sk-or-test")));

    let resp = test::call_service(&app, generate(json!({ "prompt": "a fox" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "error": "Model did not return an image", "raw": payload })
    );
}

#[actix_web::test]
async fn empty_prompt_is_bad_request() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/fox.png").to_string());
    let app = app!(client_with(upstream.clone(), Some("sk-or-test")));

    let resp = test::call_service(&app, generate(json!({ "model": "x/y" })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Prompt is required" }));
    assert_eq!(upstream.calls(), 0);
}

#[actix_web::test]
async fn malformed_body_gets_structured_error() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/fox.png").to_string());
    let app = app!(client_with(upstream.clone(), Some("sk-or-test")));

    let req = test::TestRequest::post()
        .uri("/api/generate-image")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());
    assert_eq!(upstream.calls(), 0);
}

#[actix_web::test]
async fn long_prompts_are_accepted() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/long.png").to_string());
    let app = app!(client_with(upstream.clone(), Some("sk-or-test")));

    let prompt = "a very detailed scene ".repeat(3_000);
    assert!(prompt.len() > 32 * 1024);

    let resp = test::call_service(&app, generate(json!({ "prompt": prompt })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(upstream.calls(), 1);
}

#[actix_web::test]
async fn oversized_body_is_rejected() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/big.png").to_string());
    let app = app!(client_with(upstream.clone(), Some("sk-or-test")));

    let prompt = "x".repeat(server::JSON_BODY_LIMIT + 1);
    let resp = test::call_service(&app, generate(json!({ "prompt": prompt })).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(upstream.calls(), 0);
}

#[actix_web::test]
async fn identical_requests_yield_identical_responses() {
    let upstream = FixedUpstream::new(200, image_payload("data:image/png;base64,AAAA").to_string());
    let app = app!(client_with(upstream, Some("sk-or-test")));

    let first = test::call_and_read_body(&app, generate(json!({ "prompt": "p" })).to_request()).await;
    let second = test::call_and_read_body(&app, generate(json!({ "prompt": "p" })).to_request()).await;
    assert_eq!(first, second);
}

#[actix_web::test]
async fn health_reports_credential_state() {
    let upstream = FixedUpstream::new(200, "{}");
    let app = app!(client_with(upstream, None));

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({ "status": "ok", "credential_configured": false }));
}

#[actix_web::test]
async fn preflight_from_allowed_origin_succeeds() {
    let upstream = FixedUpstream::new(200, "{}");
    let app = app!(client_with(upstream, Some("sk-or-test")));

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/generate-image")
        .insert_header((header::ORIGIN, ORIGIN))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );
}

#[actix_web::test]
async fn other_origins_are_not_allowed() {
    let upstream = FixedUpstream::new(200, image_payload("https://cdn/fox.png").to_string());
    let app = app!(client_with(upstream, Some("sk-or-test")));

    let req = test::TestRequest::post()
        .uri("/api/generate-image")
        .insert_header((header::ORIGIN, "https://evil.example.com"))
        .set_json(json!({ "prompt": "a fox" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
