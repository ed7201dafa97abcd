//! Login and token endpoints

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chirpy_auth::{PasswordError, extract_bearer_token};
use tracing::{debug, info, warn};

use super::types::{CredentialsRequest, LoginResponse, TokenResponse};
use super::users::validate_credentials;
use crate::error::ApiError;
use crate::state::AppState;

const LOGIN_FAILED: &str = "Incorrect email or password";

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_credentials(&req)?;

    let user = state.db.get_user_by_email(&req.email).await?;

    // Unknown emails still pay for a full verification
    let digest = user.as_ref().map(|u| u.hashed_password.clone());
    let verified = state.verify_password(req.password, digest).await?;

    let user = match (user, verified) {
        (Some(user), Ok(())) => user,
        (Some(user), Err(PasswordError::InvalidDigest)) => {
            warn!("Stored password digest for user {} is not valid", user.id);
            metrics::counter!("chirpy_logins_total", "outcome" => "failure").increment(1);
            return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
        }
        (_, Err(PasswordError::Hashing(e))) => {
            return Err(PasswordError::Hashing(e).into());
        }
        _ => {
            debug!("Login failed for: {}", req.email);
            metrics::counter!("chirpy_logins_total", "outcome" => "failure").increment(1);
            return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
        }
    };

    let token = state.jwt.issue(user.id)?;
    let refresh_token = state.refresh_tokens.issue(user.id).await?;

    info!("User logged in: {}", user.id);
    metrics::counter!("chirpy_logins_total", "outcome" => "success").increment(1);

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
        refresh_token,
    }))
}

/// POST /api/refresh
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let refresh_token = extract_bearer_token(&headers)?;
    let user_id = state.refresh_tokens.exchange(refresh_token).await?;
    let token = state.jwt.issue(user_id)?;

    debug!("Issued access token from refresh token for user {}", user_id);
    metrics::counter!("chirpy_token_refreshes_total").increment(1);

    Ok(Json(TokenResponse { token }))
}

/// POST /api/revoke
async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let refresh_token = extract_bearer_token(&headers)?;
    state.refresh_tokens.revoke(refresh_token).await?;

    metrics::counter!("chirpy_token_revocations_total").increment(1);
    Ok(StatusCode::NO_CONTENT)
}

/// Create login and token routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/revoke", post(revoke))
}
