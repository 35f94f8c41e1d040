pub mod handlers;
pub mod html;
pub mod routes;
pub mod shell;
pub mod state;
pub mod views;

use axum::{routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/static/app.css", get(handlers::stylesheet))
        .fallback(handlers::page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
