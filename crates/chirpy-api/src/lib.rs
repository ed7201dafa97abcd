//! Chirpy REST API
//!
//! This crate provides the Axum-based HTTP API for Chirpy: user accounts,
//! login and token refresh, chirps, the Polka webhook, the admin pages and
//! the embedded web app.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
