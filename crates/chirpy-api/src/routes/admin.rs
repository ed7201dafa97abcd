//! Admin pages

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use std::sync::atomic::Ordering;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::{AppState, DEV_PLATFORM};

/// GET /admin/metrics
async fn admin_metrics(State(state): State<AppState>) -> Html<String> {
    let hits = state.hits.load(Ordering::Relaxed);
    Html(format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits
    ))
}

/// POST /admin/reset
///
/// Deletes every user along with their chirps and refresh tokens.
async fn reset(State(state): State<AppState>) -> Result<(StatusCode, &'static str), ApiError> {
    if state.platform.is_empty() {
        return Err(ApiError::ServiceUnavailable(
            "Platform is not configured".to_string(),
        ));
    }
    if state.platform != DEV_PLATFORM {
        warn!("Reset refused on platform: {}", state.platform);
        return Err(ApiError::Forbidden(
            "Reset is only allowed in dev environment".to_string(),
        ));
    }

    let deleted = state.db.delete_all_users().await?;
    state.hits.store(0, Ordering::Relaxed);

    info!("Reset database: {} users deleted", deleted);
    Ok((
        StatusCode::OK,
        "Hits reset to 0 and database reset to initial state.",
    ))
}

/// Create admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/metrics", get(admin_metrics))
        .route("/admin/reset", post(reset))
}
