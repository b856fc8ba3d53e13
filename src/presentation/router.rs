// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    check_health, liveness, publish_stream, query_data, subscribe_stream,
};
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(liveness))
        .route("/health", get(check_health).post(check_health))
        .route("/query", post(query_data))
        .route("/streams/:path", get(subscribe_stream).post(publish_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
