//! Access token extractor for Axum

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::bearer::extract_bearer_token;
use crate::error::AuthError;
use crate::jwt::JwtManager;

/// Authenticated user information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Requires a valid access token in the `Authorization` header
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let token = extract_bearer_token(&parts.headers)?;
        let id = jwt.verify(token)?;

        debug!("Authenticated user: {}", id);
        Ok(AuthUser { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessTokenError, CredentialError};
    use axum::http::{Request, header::AUTHORIZATION};
    use chrono::Duration;

    async fn extract(request: Request<()>, jwt: &Arc<JwtManager>) -> Result<AuthUser, AuthError> {
        let (mut parts, _) = request.into_parts();
        AuthUser::from_request_parts(&mut parts, jwt).await
    }

    #[tokio::test]
    async fn test_valid_token() {
        let jwt = Arc::new(JwtManager::new(b"secret", Duration::hours(1)));
        let user_id = Uuid::new_v4();
        let token = jwt.issue(user_id).unwrap();

        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap();

        assert_eq!(extract(request, &jwt).await.unwrap().id, user_id);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let jwt = Arc::new(JwtManager::new(b"secret", Duration::hours(1)));
        let request = Request::builder().body(()).unwrap();

        assert!(matches!(
            extract(request, &jwt).await,
            Err(AuthError::Credential(CredentialError::MissingCredential))
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let jwt = Arc::new(JwtManager::new(b"secret", Duration::hours(-1)));
        let token = jwt.issue(Uuid::new_v4()).unwrap();

        let request = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap();

        assert!(matches!(
            extract(request, &jwt).await,
            Err(AuthError::AccessToken(AccessTokenError::Expired))
        ));
    }
}
