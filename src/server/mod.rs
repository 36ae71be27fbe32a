pub mod handlers;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use crate::{config::Config, error::RelayError, openrouter::ImageClient};

/// CORS policy for the single configured frontend origin.
pub fn build_cors(origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(origin)
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}

/// Largest accepted request body.
pub const JSON_BODY_LIMIT: usize = 100 * 1024;

/// Malformed bodies get the same `{ error, details }` shape as relay failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            log::warn!("Rejected malformed request body: {}", err);
            RelayError::InvalidBody(err.to_string()).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(handlers::health)
        .service(handlers::generate_image);
}

pub async fn run(config: Config, images: ImageClient) -> std::io::Result<()> {
    let data = web::Data::new(images);
    let origin = config.server.allowed_origin.clone();
    let (host, port) = config.server.bind_address();

    log::info!("✅ Server running on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&origin))
            .wrap(Logger::new("%a \"%r\" %s %Dms"))
            .app_data(data.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
