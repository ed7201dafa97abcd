//! API routes

mod admin;
mod app;
mod auth;
pub mod chirps;
mod health;
pub mod metrics;
pub mod types;
mod users;
mod webhooks;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Readiness
        .merge(health::routes())
        // Accounts and tokens
        .merge(users::routes())
        .merge(auth::routes())
        // Chirps
        .merge(chirps::routes())
        // Payment provider callbacks
        .merge(webhooks::routes())
        // Admin pages
        .merge(admin::routes())
        // Web app
        .merge(app::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
