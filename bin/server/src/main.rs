use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use postbox_core::MessageService;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dto;
mod error;
mod routers;
mod service;

use config::Settings;

/// Health check endpoint
#[instrument]
async fn healthcheck() -> &'static str {
    "Healthy"
}

/// Build the Axum router around a message service
fn create_app(message_service: Arc<MessageService>) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .merge(routers::create_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
                .layer(CorsLayer::permissive())
                .layer(Extension(message_service)),
        )
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "postbox_server=debug,postbox_core=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::load()?;
    info!("Starting Postbox server with settings: {:?}", settings);

    let message_service = Arc::new(service::build_message_service(&settings).await);
    let app = create_app(message_service);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&settings.server_address()).await?;
    info!("Server listening on {}", settings.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use postbox_core::{
        errors::StorageResult,
        storage::MemoryStore,
        LlmModerator, Message, MessageStore, ModerationCategory, ModerationPolicy, ModerationVerdict,
        Moderator, StorageBackend, StorageError,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct UnavailableStore;

    #[async_trait]
    impl MessageStore for UnavailableStore {
        async fn store(&self, _message: &Message) -> StorageResult<()> {
            Err(StorageError::Query("write refused by backend-7".to_string()))
        }

        async fn list_all(&self) -> StorageResult<Vec<Message>> {
            Err(StorageError::Query("read refused by backend-7".to_string()))
        }

        async fn health_check(&self) -> StorageResult<bool> {
            Ok(false)
        }

        fn backend(&self) -> StorageBackend {
            StorageBackend::Neo4j
        }
    }

    struct SpamModerator;

    #[async_trait]
    impl Moderator for SpamModerator {
        async fn classify(&self, content: &str) -> ModerationVerdict {
            if content.contains("buy now") {
                ModerationVerdict::classified(ModerationCategory::Spam, 0.95, "advertising".to_string())
            } else {
                ModerationVerdict::classified(ModerationCategory::Clean, 0.9, String::new())
            }
        }
    }

    fn app_with(store: Arc<dyn MessageStore>) -> Router {
        let service = MessageService::new(
            store,
            Arc::new(LlmModerator::disabled()),
            ModerationPolicy::Observe,
        );
        create_app(Arc::new(service))
    }

    fn moderated_app(policy: ModerationPolicy) -> Router {
        let service = MessageService::new(Arc::new(MemoryStore::new()), Arc::new(SpamModerator), policy);
        create_app(Arc::new(service))
    }

    fn memory_app() -> Router {
        app_with(Arc::new(MemoryStore::new()))
    }

    fn post_message(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/message")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_plain_text() {
        let response = app_with(Arc::new(UnavailableStore)).oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Healthy");
    }

    #[tokio::test]
    async fn test_create_message_defaults_username() {
        let before = chrono::Utc::now();
        let response = memory_app().oneshot(post_message(r#"{"content":"hello"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        let fields = body.as_object().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(body["content"], "hello");
        assert_eq!(body["username"], "anonymous");
        assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());

        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(timestamp.ends_with('Z'));
        let timestamp = chrono::DateTime::parse_from_rfc3339(timestamp)
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert!(timestamp >= before);
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected_and_not_stored() {
        let app = memory_app();

        let response = app.clone().oneshot(post_message(r#"{"content":""}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = app.oneshot(get_request("/messages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let response = memory_app().oneshot(post_message("{content: hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_created_messages_are_listed() {
        let app = memory_app();

        let first = json_body(
            app.clone()
                .oneshot(post_message(r#"{"content":"one","username":"ada"}"#))
                .await
                .unwrap(),
        )
        .await;
        let second = json_body(app.clone().oneshot(post_message(r#"{"content":"two"}"#)).await.unwrap()).await;

        let response = app.oneshot(get_request("/messages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([first, second]));
    }

    #[tokio::test]
    async fn test_storage_failures_are_generic_500s() {
        let app = app_with(Arc::new(UnavailableStore));

        let response = app.clone().oneshot(post_message(r#"{"content":"hi"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to store message");

        let response = app.oneshot(get_request("/messages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to read messages");
        assert!(!body.to_string().contains("backend-7"));
    }

    #[tokio::test]
    async fn test_enforce_policy_rejects_with_422_and_stores_nothing() {
        let app = moderated_app(ModerationPolicy::Enforce);

        let kept = json_body(app.clone().oneshot(post_message(r#"{"content":"hello"}"#)).await.unwrap()).await;

        let response = app
            .clone()
            .oneshot(post_message(r#"{"content":"buy now, cheap watches"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("spam"), "got {}", error);

        let response = app.oneshot(get_request("/messages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([kept]));
    }

    #[tokio::test]
    async fn test_observe_policy_stores_disallowed_messages() {
        let app = moderated_app(ModerationPolicy::Observe);

        let response = app
            .clone()
            .oneshot(post_message(r#"{"content":"buy now, cheap watches"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app.oneshot(get_request("/messages")).await.unwrap();
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
    }
}
