use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use postbox_core::{Message, MessageService};
use tracing::debug;

use crate::error::ApiError;

/// Create ingest router
pub fn create_router() -> Router {
    Router::new().route("/message", post(create_message))
}

/// Validate, moderate and store a message.
///
/// The body is taken raw so malformed JSON is reported by the validator
/// with the same error shape as a missing field.
async fn create_message(
    Extension(service): Extension<Arc<MessageService>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let accepted = service
        .create_message(&body)
        .await
        .map_err(ApiError::from_create)?;

    debug!(
        "Message {} moderation: allowed={} category={}",
        accepted.message.id, accepted.verdict.is_allowed, accepted.verdict.category
    );

    Ok((StatusCode::CREATED, Json(accepted.message)))
}
