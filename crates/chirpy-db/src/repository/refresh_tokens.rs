//! Refresh token operations

use async_trait::async_trait;
use chirpy_auth::{RefreshToken, RefreshTokenStore, StoreError};
use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::refresh_token_from_row;
use crate::repository::Database;
use crate::utils::format_datetime;

impl Database {
    /// Insert a refresh token
    pub async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id.to_string())
        .bind(format_datetime(token.created_at))
        .bind(format_datetime(token.updated_at))
        .bind(format_datetime(token.expires_at))
        .bind(token.revoked_at.map(format_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "refresh token"))?;
        Ok(())
    }

    /// Get a refresh token by value
    pub async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| refresh_token_from_row(&row).map_err(DbError::from))
            .transpose()
    }

    /// Revoke a refresh token; an existing revocation time is kept.
    ///
    /// Returns `false` when the token does not exist.
    pub async fn revoke_refresh_token(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let at = format_datetime(at);
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET updated_at = CASE WHEN revoked_at IS NULL THEN ? ELSE updated_at END,
                revoked_at = COALESCE(revoked_at, ?)
            WHERE token = ?
            "#,
        )
        .bind(&at)
        .bind(&at)
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RefreshTokenStore for Database {
    async fn insert(&self, token: &RefreshToken) -> Result<(), StoreError> {
        Ok(self.insert_refresh_token(token).await?)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self.get_refresh_token(token).await?)
    }

    async fn set_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(self.revoke_refresh_token(token, at).await?)
    }
}
