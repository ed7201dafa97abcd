//! Readiness endpoint

use axum::{Router, http::header, response::IntoResponse, routing::get};

use crate::state::AppState;

/// GET /api/healthz
async fn healthz() -> impl IntoResponse {
    metrics::counter!("chirpy_health_checks_total").increment(1);

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "OK")
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/healthz", get(healthz))
}
