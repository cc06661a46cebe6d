mod config;
mod inference;
mod routes;

use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use config::AppConfig;
use inference::loader::ModelLoader;
use routes::configure_routes;
use std::{env, io};

/// Applies environment overrides on top of the loaded configuration.
fn apply_env_overrides(config: &mut AppConfig, port: Option<String>) -> io::Result<()> {
    if let Some(port) = port {
        config.server.port = port.parse().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("PORT is not a valid port number: {}", port),
            )
        })?;
        log::info!("Port overridden by PORT: {}", config.server.port);
    }
    Ok(())
}

/// Loads the model up front. The server must not start without it.
async fn preload(loader: &ModelLoader) -> io::Result<()> {
    loader.get().await.map(|_| ()).map_err(|e| {
        log::error!("Failed to preload model at startup: {}", e);
        io::Error::other(format!("Model loading failed: {}", e))
    })
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let (mut config, config_path) = AppConfig::load().map_err(|e| {
        log::error!("{}", e);
        io::Error::new(io::ErrorKind::InvalidData, e.to_string())
    })?;
    match &config_path {
        Some(path) => log::info!("Loaded configuration from {}", path.display()),
        None => log::info!("No configuration file found, using defaults"),
    }

    apply_env_overrides(&mut config, env::var("PORT").ok())?;

    let loader = web::Data::new(ModelLoader::from_config(&config));
    if config.model.preload {
        preload(&loader).await?;
    } else {
        log::info!("Model {} will be loaded on first upload", loader.source());
    }

    let bind_address = config.bind_address();
    let static_dir = config.server.static_dir.clone();
    let config = web::Data::new(config);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(loader.clone())
            .app_data(config.clone())
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
