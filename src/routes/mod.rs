pub mod feeds;
pub mod follows;
pub mod posts;

use crate::{
    error::AppError,
    state::AppState,
    utils::middleware::{auth_middleware, request_id_middleware, request_logging_middleware},
};
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

/// 构建应用路由
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(feeds::router())
        .merge(posts::router())
        .merge(follows::router())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "Yatube is running!"
}

async fn not_found() -> AppError {
    AppError::not_found("Page")
}
