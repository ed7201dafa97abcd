//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures while pulling a bearer credential out of request headers
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("no authorization header found")]
    MissingCredential,

    #[error("invalid authorization header")]
    MalformedCredential,
}

/// Failures while hashing or verifying a password
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password does not match")]
    PasswordMismatch,

    #[error("stored password digest is not valid")]
    InvalidDigest,

    #[error("password hashing error: {0}")]
    Hashing(String),
}

/// Failures while issuing or verifying an access token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenError {
    #[error("access token signature is invalid")]
    BadSignature,

    #[error("access token expired")]
    Expired,

    #[error("access token is malformed")]
    Malformed,

    #[error("access token signing error: {0}")]
    Signing(String),
}

/// Opaque failure reported by a refresh-token storage backend
#[derive(Error, Debug)]
#[error("refresh token storage error: {0}")]
pub struct StoreError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(Box::new(err))
    }
}

/// Failures while issuing, looking up, exchanging or revoking a refresh token
#[derive(Error, Debug)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,

    #[error("refresh token revoked")]
    Revoked,

    #[error("refresh token expired")]
    Expired,

    #[error("refresh token storage timed out")]
    Timeout,

    #[error("refresh token lifetime out of range")]
    LifetimeOutOfRange,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Any failure raised by the authentication core
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    AccessToken(#[from] AccessTokenError),

    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
}

impl AuthError {
    /// HTTP status this failure maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Password(PasswordError::Hashing(_))
            | AuthError::AccessToken(AccessTokenError::Signing(_))
            | AuthError::RefreshToken(RefreshTokenError::Storage(_))
            | AuthError::RefreshToken(RefreshTokenError::LifetimeOutOfRange) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::RefreshToken(RefreshTokenError::Timeout) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::UNAUTHORIZED {
            self.to_string()
        } else {
            "Internal error".to_string()
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
