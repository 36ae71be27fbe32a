use image_relay::{logger, server, Config, ImageClient};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(config.logger.clone())?;

    if env_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        &config.server.host,
        config.server.port,
    );
    logger::log_config_info(&config);

    if let Err(e) = config.validate() {
        log::error!("❌ {}", e);
        return Err(e.into());
    }

    let images = ImageClient::new(&config.openrouter)?;
    server::run(config, images).await?;

    Ok(())
}
