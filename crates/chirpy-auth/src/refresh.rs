//! Refresh token issuance, lookup and revocation
//!
//! Refresh tokens are opaque random strings persisted through a
//! [`RefreshTokenStore`]. Expiry is never swept: a token simply stops being
//! usable once `expires_at` has passed, which callers observe through
//! [`RefreshToken::check_usable`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{RefreshTokenError, StoreError};

/// Bytes of entropy in a refresh token before hex encoding
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Observed state of a refresh token at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

impl RefreshToken {
    /// State of the token at `now`. Revocation wins over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if self.expires_at <= now {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    /// Return the owning user if the token can be exchanged at `now`
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<Uuid, RefreshTokenError> {
        match self.state_at(now) {
            RefreshTokenState::Active => Ok(self.user_id),
            RefreshTokenState::Expired => Err(RefreshTokenError::Expired),
            RefreshTokenState::Revoked => Err(RefreshTokenError::Revoked),
        }
    }
}

/// Storage backend for refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new token. The token value must be unique.
    async fn insert(&self, token: &RefreshToken) -> Result<(), StoreError>;

    /// Find a token by its value
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Mark a token revoked at `at` unless it already is.
    ///
    /// Returns `false` when no such token exists.
    async fn set_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;
}

/// Issues, looks up and revokes refresh tokens
#[derive(Clone)]
pub struct RefreshTokenManager {
    store: Arc<dyn RefreshTokenStore>,
    lifetime: Duration,
    store_timeout: std::time::Duration,
}

impl RefreshTokenManager {
    /// Create a new refresh token manager
    pub fn new(
        store: Arc<dyn RefreshTokenStore>,
        lifetime: Duration,
        store_timeout: std::time::Duration,
    ) -> Self {
        Self {
            store,
            lifetime,
            store_timeout,
        }
    }

    /// Issue and persist a new refresh token for a user
    pub async fn issue(&self, user_id: Uuid) -> Result<String, RefreshTokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or(RefreshTokenError::LifetimeOutOfRange)?;
        let record = RefreshToken {
            token: generate_token(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };

        self.bounded(self.store.insert(&record)).await?;

        debug!("Issued refresh token for user: {}", user_id);
        Ok(record.token)
    }

    /// Look up a token without judging its state
    pub async fn lookup(&self, token: &str) -> Result<RefreshToken, RefreshTokenError> {
        self.bounded(self.store.find_by_token(token))
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Look up a token and return its user if it is still usable
    pub async fn exchange(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        let record = self.lookup(token).await?;
        record.check_usable(Utc::now())
    }

    /// Revoke a token. Revoking an already revoked token succeeds and keeps
    /// the original revocation time.
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        let found = self.bounded(self.store.set_revoked(token, Utc::now())).await?;
        if !found {
            return Err(RefreshTokenError::NotFound);
        }

        debug!("Revoked refresh token");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, RefreshTokenError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| RefreshTokenError::Timeout)?
            .map_err(RefreshTokenError::from)
    }
}

/// Generate a hex-encoded token from the OS random source
fn generate_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
