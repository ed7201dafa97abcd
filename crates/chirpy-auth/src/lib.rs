//! Chirpy Authentication
//!
//! This crate provides bearer credential extraction, Argon2id password
//! hashing, JWT access tokens and storage-backed refresh tokens for Chirpy.

pub mod bearer;
pub mod error;
pub mod extractor;
pub mod jwt;
pub mod password;
pub mod refresh;

pub use bearer::{
    api_key_matches, extract_api_key, extract_bearer_token, strip_bearer_prefix,
};
pub use error::{
    AccessTokenError, AuthError, CredentialError, PasswordError, RefreshTokenError, StoreError,
};
pub use extractor::AuthUser;
pub use jwt::{Claims, ISSUER, JwtManager};
pub use password::{PasswordCost, PasswordManager};
pub use refresh::{RefreshToken, RefreshTokenManager, RefreshTokenState, RefreshTokenStore};
