//! Chirpy Database Layer
//!
//! This crate provides the database abstraction layer for Chirpy,
//! using SQLite via sqlx for users, chirps and refresh tokens.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, PoolSettings};
