use std::sync::Arc;

use axum::{extract::Extension, response::Json, routing::get, Router};
use postbox_core::{Message, MessageService};

use crate::error::ApiError;

/// Create retrieve router
pub fn create_router() -> Router {
    Router::new().route("/messages", get(list_messages))
}

/// List every stored message
async fn list_messages(
    Extension(service): Extension<Arc<MessageService>>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = service.list_messages().await.map_err(ApiError::from_list)?;
    Ok(Json(messages))
}
