//! Application state

use axum::extract::FromRef;
use chirpy_auth::{JwtManager, PasswordError, PasswordManager, RefreshTokenManager};
use chirpy_db::Database;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use crate::error::ApiError;

/// Handle used to render the Prometheus exposition
pub type MetricsHandle = PrometheusHandle;

/// Platform name that enables destructive admin endpoints
pub const DEV_PLATFORM: &str = "dev";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub passwords: Arc<PasswordManager>,
    pub refresh_tokens: Arc<RefreshTokenManager>,
    /// Requests served from `/app`, reset by `/admin/reset`
    pub hits: Arc<AtomicU64>,
    pub platform: String,
    pub polka_key: Option<String>,
}

impl AppState {
    pub fn new(
        db: Database,
        jwt: Arc<JwtManager>,
        passwords: Arc<PasswordManager>,
        refresh_tokens: Arc<RefreshTokenManager>,
        platform: String,
        polka_key: Option<String>,
    ) -> Self {
        Self {
            db,
            jwt,
            passwords,
            refresh_tokens,
            hits: Arc::new(AtomicU64::new(0)),
            platform,
            polka_key,
        }
    }

    /// Hash a password on the blocking pool
    pub async fn hash_password(&self, plaintext: String) -> Result<String, ApiError> {
        let passwords = self.passwords.clone();
        let digest = tokio::task::spawn_blocking(move || passwords.hash(&plaintext))
            .await
            .map_err(|e| ApiError::Internal(format!("password hashing task failed: {}", e)))??;
        Ok(digest)
    }

    /// Verify a password on the blocking pool.
    ///
    /// With no stored digest the comparison still runs against a dummy digest
    /// and always fails.
    pub async fn verify_password(
        &self,
        plaintext: String,
        digest: Option<String>,
    ) -> Result<Result<(), PasswordError>, ApiError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || match digest {
            Some(digest) => passwords.verify(&plaintext, &digest),
            None => passwords.verify_absent(&plaintext),
        })
        .await
        .map_err(|e| ApiError::Internal(format!("password verification task failed: {}", e)))
    }
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
