//! Chirp operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Chirp, NewChirp, SortOrder};
use crate::repository::Database;
use crate::utils::format_datetime;

impl Database {
    /// Insert a new chirp
    pub async fn insert_chirp(&self, chirp: NewChirp) -> Result<Chirp, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO chirps (id, body, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&chirp.body)
        .bind(chirp.user_id.to_string())
        .bind(format_datetime(now))
        .bind(format_datetime(now))
        .execute(&self.pool)
        .await?;

        Ok(Chirp {
            id,
            body: chirp.body,
            user_id: chirp.user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// List chirps, optionally filtered by author, ordered by creation time
    pub async fn list_chirps(
        &self,
        author_id: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Chirp>, DbError> {
        let mut sql = String::from(
            "SELECT id, body, user_id, created_at, updated_at FROM chirps",
        );
        if author_id.is_some() {
            sql.push_str(" WHERE user_id = ?");
        }
        // rowid breaks ties between chirps created in the same microsecond
        sql.push_str(&format!(
            " ORDER BY created_at {dir}, rowid {dir}",
            dir = order.as_sql()
        ));

        let mut query = sqlx::query(&sql);
        if let Some(author_id) = author_id {
            query = query.bind(author_id.to_string());
        }

        let rows = query.fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Chirp::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a chirp by ID
    pub async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, body, user_id, created_at, updated_at
            FROM chirps
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Chirp::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Delete a chirp
    pub async fn delete_chirp(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
