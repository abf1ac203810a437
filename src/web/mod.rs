pub mod routes;
pub mod sse;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/recent", get(routes::recent))
        .route("/api/stats", get(routes::stats))
        .route("/api/trends", get(routes::trends))
        .route("/api/languages", get(routes::languages))
        .route("/api/geography", get(routes::geography))
        .route("/api/enriched", get(routes::enriched))
        .route("/api/stream/start", post(routes::stream_start))
        .route("/api/stream/stop", post(routes::stream_stop))
        .route("/sse", get(sse::sse_handler))
        .with_state(state)
}
