use axum::Router;

pub mod ingest;
pub mod retrieve;

/// Create the message API router
pub fn create_router() -> Router {
    Router::new()
        .merge(ingest::create_router())
        .merge(retrieve::create_router())
}
