use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chatrelay_server::config::CorsConfig;
use chatrelay_server::{AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cors(config: &CorsConfig) -> Cors {
    if !config.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors = if config.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        Cors::default()
            .allowed_methods(vec!["GET"])
            .allow_any_header()
    };

    cors.max_age(config.max_age as usize)
}

#[actix_web::main]
async fn main() -> chatrelay_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    if config.completion.api_key.is_empty() {
        warn!("No API key configured; completion requests will be rejected upstream");
    }

    let state = web::Data::new(AppState::new(config.clone())?);

    let workers = config.server.workers as usize;
    let listener = TcpListener::bind(config.bind_address())?;
    info!(
        "Chat relay ready at http://{} (websocket at /ws, model {})",
        config.bind_address(),
        config.completion.model
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(&config.cors))
            .app_data(state.clone())
            .configure(|cfg| chatrelay_server::configure(cfg, &config.chat))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
