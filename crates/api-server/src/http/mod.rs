use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::pipeline::ReplyPipeline;

mod chat;
mod errors;
mod health;
mod observability;

pub use observability::REQUEST_ID_HEADER;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: ReplyPipeline,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/chat", post(chat::chat))
        .layer(middleware::from_fn(observability::request_span_middleware))
        .with_state(app_state)
}
