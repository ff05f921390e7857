use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use chatrelay_server::{AppState, CompletionClient, Message, ProxyError, Settings};
use std::sync::Arc;

struct UnusedClient;

#[async_trait]
impl CompletionClient for UnusedClient {
    async fn complete(&self, _messages: &[Message]) -> Result<String, ProxyError> {
        Err(ProxyError::EmptyResponse)
    }
}

fn state_with(config: Settings) -> web::Data<AppState> {
    web::Data::new(AppState::with_client(config, Arc::new(UnusedClient)))
}

#[actix_web::test]
async fn test_chat_page_served_at_root() {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let chat = config.chat.clone();
    let app = test::init_service(
        App::new()
            .app_data(state_with(config))
            .configure(|cfg| chatrelay_server::configure(cfg, &chat))
    ).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "content type was {}", content_type);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/static/js/chat.js"));
}

#[actix_web::test]
async fn test_static_assets() {
    let config = Settings::new_for_test().expect("Failed to load test config");
    let chat = config.chat.clone();
    let app = test::init_service(
        App::new()
            .app_data(state_with(config))
            .configure(|cfg| chatrelay_server::configure(cfg, &chat))
    ).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/static/js/chat.js").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("new WebSocket"));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/static/missing.js").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_missing_index_is_not_found() {
    let mut config = Settings::new_for_test().expect("Failed to load test config");
    config.chat.index_file = "static/does-not-exist.html".to_string();
    let chat = config.chat.clone();
    let app = test::init_service(
        App::new()
            .app_data(state_with(config))
            .configure(|cfg| chatrelay_server::configure(cfg, &chat))
    ).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(json["error"]["status"], 404);
}
