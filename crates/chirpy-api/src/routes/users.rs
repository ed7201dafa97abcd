//! User account endpoints

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use chirpy_auth::AuthUser;
use chirpy_db::NewUser;
use tracing::info;

use super::types::{CredentialsRequest, MAX_EMAIL_LENGTH, MAX_PASSWORD_LENGTH, UserResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Reject oversized or empty credentials before any hashing work
pub(super) fn validate_credentials(req: &CredentialsRequest) -> Result<(), ApiError> {
    if req.email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if req.email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email must be at most {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    if req.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// POST /api/users
async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_credentials(&req)?;

    let hashed_password = state.hash_password(req.password).await?;
    let user = state
        .db
        .insert_user(NewUser {
            email: req.email,
            hashed_password,
        })
        .await?;

    info!("Created user: {}", user.id);
    metrics::counter!("chirpy_users_created_total").increment(1);

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/users
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_credentials(&req)?;

    let hashed_password = state.hash_password(req.password).await?;
    let user = state
        .db
        .update_user_email_and_password(auth.id, &req.email, &hashed_password)
        .await?;

    info!("Updated user: {}", user.id);
    Ok(Json(user.into()))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/users", post(create_user).put(update_user))
}
