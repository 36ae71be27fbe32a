use actix_web::{get, post, web, HttpResponse};

use crate::{
    error::Result,
    models::{HealthResponse, ImageGenerationRequest, ImageGenerationResponse},
    openrouter::ImageClient,
};

#[get("/health")]
pub async fn health(images: web::Data<ImageClient>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        credential_configured: images.has_credential(),
    })
}

#[post("/api/generate-image")]
pub async fn generate_image(
    images: web::Data<ImageClient>,
    req: web::Json<ImageGenerationRequest>,
) -> Result<web::Json<ImageGenerationResponse>> {
    let response = images.generate(req.into_inner()).await?;
    Ok(web::Json(response))
}
