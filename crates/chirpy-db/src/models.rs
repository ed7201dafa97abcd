//! Database models

use crate::utils::{parse_datetime_or_now, parse_uuid};
use chirpy_auth::RefreshToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error type for parsing models from strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidSortOrder(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidSortOrder(s) => write!(f, "Invalid sort order: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
}

/// Chirp model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New chirp (for insertion)
#[derive(Debug, Clone)]
pub struct NewChirp {
    pub body: String,
    pub user_id: Uuid,
}

/// Chirp ordering by creation time
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ParseError::InvalidSortOrder(s.to_string())),
        }
    }
}

// ==================== Row Conversions ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            email: row.try_get("email")?,
            hashed_password: row.try_get("hashed_password")?,
            is_chirpy_red: row.try_get("is_chirpy_red")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Chirp {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Chirp {
            id: parse_uuid(&row.try_get::<String, _>("id")?)?,
            body: row.try_get("body")?,
            user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

/// Build a [`RefreshToken`] from a `refresh_tokens` row
pub(crate) fn refresh_token_from_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<RefreshToken, sqlx::Error> {
    let revoked_at: Option<String> = row.try_get("revoked_at")?;
    Ok(RefreshToken {
        token: row.try_get("token")?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?)?,
        created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        expires_at: parse_datetime_or_now(&row.try_get::<String, _>("expires_at")?),
        revoked_at: revoked_at.as_deref().map(parse_datetime_or_now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert_eq!(
            "sideways".parse::<SortOrder>(),
            Err(ParseError::InvalidSortOrder("sideways".to_string()))
        );
        assert_eq!(SortOrder::default(), SortOrder::Asc);
    }
}
