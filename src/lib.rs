pub mod chat;
pub mod config;
pub mod error;
pub mod pages;
pub mod proxy;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::{AppError, ProxyError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use chat::{Message, Role, Session, Transcript};
pub use proxy::{ChatCompletionsClient, CompletionClient};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers. Read-only: every
/// connection builds its own session from it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub completion: Arc<dyn CompletionClient>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self> {
        let client = ChatCompletionsClient::new(&config.completion)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    pub fn with_client(config: Settings, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            config: Arc::new(config),
            completion,
        }
    }
}

/// Register every route of the relay.
pub fn configure(cfg: &mut web::ServiceConfig, chat: &config::ChatConfig) {
    cfg.route("/", web::get().to(pages::chat_page))
        .route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(websocket::websocket_route))
        .service(pages::static_files(&chat.static_dir));
}
