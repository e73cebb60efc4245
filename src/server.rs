use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Ingest (load generators post here) ──────────────────
        .route("/metrics", post(handlers::ingest::receive_metrics))
        // ── Tables ──────────────────────────────────────────────
        .route("/api/aggregate", get(handlers::aggregate::get_aggregate))
        .route("/api/errors", get(handlers::aggregate::get_errors))
        .route("/api/success", get(handlers::aggregate::get_success))
        .route("/api/labels", get(handlers::aggregate::get_labels))
        // ── Per-second series ───────────────────────────────────
        .route("/api/tps", get(handlers::series::get_throughput))
        .route("/api/threads", get(handlers::series::get_concurrency))
        .route("/api/errorpct", get(handlers::series::get_error_rate))
        // ── CSV downloads ───────────────────────────────────────
        .route(
            "/download/aggregate.csv",
            get(handlers::export::aggregate_csv),
        )
        .route("/download/errors.csv", get(handlers::export::errors_csv))
        .route("/download/success.csv", get(handlers::export::success_csv))
        .route("/health", get(handlers::health))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
