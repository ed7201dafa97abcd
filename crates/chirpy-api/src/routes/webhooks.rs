//! Polka payment webhooks

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chirpy_auth::{api_key_matches, extract_api_key};
use tracing::{debug, info};
use uuid::Uuid;

use super::types::PolkaWebhookRequest;
use crate::error::ApiError;
use crate::state::AppState;

const USER_UPGRADED: &str = "user.upgraded";

/// POST /api/polka/webhooks
async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PolkaWebhookRequest>,
) -> Result<StatusCode, ApiError> {
    if let Some(expected) = state.polka_key.as_deref() {
        let key = extract_api_key(&headers)?;
        if !api_key_matches(key, expected) {
            return Err(ApiError::Unauthorized("Invalid API key".to_string()));
        }
    }

    if req.event != USER_UPGRADED {
        debug!("Ignoring Polka event: {}", req.event);
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = Uuid::parse_str(&req.data.user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user ID".to_string()))?;

    if !state.db.upgrade_user_to_chirpy_red(user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("User {} upgraded to Chirpy Red", user_id);
    metrics::counter!("chirpy_red_upgrades_total").increment(1);

    Ok(StatusCode::NO_CONTENT)
}

/// Create webhook routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/polka/webhooks", post(polka_webhook))
}
