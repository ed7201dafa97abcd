//! Chirp endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chirpy_auth::AuthUser;
use chirpy_db::{NewChirp, SortOrder};
use tracing::info;
use uuid::Uuid;

use super::types::{ChirpResponse, CreateChirpRequest, ListChirpsQuery};
use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted chirp, in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];
const CENSORED: &str = "****";

/// Validate a chirp body and mask profane words.
///
/// Words are split on single spaces and compared case-insensitively, so a
/// profane word with punctuation attached is left alone.
pub fn clean_chirp_body(body: &str) -> Result<String, ApiError> {
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::BadRequest("Chirp is too long".to_string()));
    }

    let cleaned = body
        .split(' ')
        .map(|word| {
            let lowered = word.to_lowercase();
            if PROFANE_WORDS.contains(&lowered.as_str()) {
                CENSORED
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    Ok(cleaned)
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {}", what)))
}

/// POST /api/chirps
async fn create_chirp(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateChirpRequest>,
) -> Result<(StatusCode, Json<ChirpResponse>), ApiError> {
    let body = clean_chirp_body(&req.body)?;

    let chirp = state
        .db
        .insert_chirp(NewChirp {
            body,
            user_id: auth.id,
        })
        .await?;

    info!("User {} created chirp {}", auth.id, chirp.id);
    metrics::counter!("chirpy_chirps_created_total").increment(1);

    Ok((StatusCode::CREATED, Json(chirp.into())))
}

/// GET /api/chirps
async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<ChirpResponse>>, ApiError> {
    let author_id = match query.author_id.as_deref() {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "author ID")?),
        _ => None,
    };

    let order = match query.sort.as_deref() {
        Some(raw) if !raw.is_empty() => raw
            .parse::<SortOrder>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        _ => SortOrder::default(),
    };

    let chirps = state.db.list_chirps(author_id, order).await?;
    Ok(Json(chirps.into_iter().map(ChirpResponse::from).collect()))
}

/// GET /api/chirps/{id}
async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChirpResponse>, ApiError> {
    let id = parse_id(&id, "chirp ID")?;

    let chirp = state
        .db
        .get_chirp(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".to_string()))?;

    Ok(Json(chirp.into()))
}

/// DELETE /api/chirps/{id}
async fn delete_chirp(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "chirp ID")?;

    let chirp = state
        .db
        .get_chirp(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".to_string()))?;

    if chirp.user_id != auth.id {
        return Err(ApiError::Forbidden(
            "You can't delete this chirp".to_string(),
        ));
    }

    if !state.db.delete_chirp(id).await? {
        return Err(ApiError::NotFound("Chirp not found".to_string()));
    }

    info!("User {} deleted chirp {}", auth.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create chirp routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chirps", get(list_chirps).post(create_chirp))
        .route("/api/chirps/{id}", get(get_chirp).delete(delete_chirp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_chirp_body_masks_profanity() {
        assert_eq!(
            clean_chirp_body("This is a kerfuffle opinion I need to share with the world").unwrap(),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(
            clean_chirp_body("I hear Mastodon is better than Chirpy. sharbert I need to migrate")
                .unwrap(),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(
            clean_chirp_body("I really need a KERFUFFLE to go to bed sooner, Fornax !").unwrap(),
            "I really need a **** to go to bed sooner, **** !"
        );
    }

    #[test]
    fn test_clean_chirp_body_keeps_punctuated_words() {
        assert_eq!(clean_chirp_body("Sharbert!").unwrap(), "Sharbert!");
    }

    #[test]
    fn test_clean_chirp_body_length() {
        let exact = "a".repeat(MAX_CHIRP_LENGTH);
        assert_eq!(clean_chirp_body(&exact).unwrap(), exact);

        let too_long = "a".repeat(MAX_CHIRP_LENGTH + 1);
        assert!(matches!(
            clean_chirp_body(&too_long),
            Err(ApiError::BadRequest(_))
        ));

        // Length is counted in characters, not bytes
        let wide = "\u{00E9}".repeat(MAX_CHIRP_LENGTH);
        assert!(clean_chirp_body(&wide).is_ok());
    }
}
