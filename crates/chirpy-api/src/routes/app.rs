//! Embedded web app

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;
use std::sync::atomic::Ordering;

use crate::state::AppState;

/// Static files served under `/app`
#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/../../app"]
struct Assets;

fn serve_asset(state: &AppState, path: &str) -> Response {
    state.hits.fetch_add(1, Ordering::Relaxed);
    metrics::counter!("chirpy_app_hits_total").increment(1);

    let path = if path.is_empty() || path.ends_with('/') {
        format!("{}index.html", path)
    } else {
        path.to_string()
    };

    match <Assets as Embed>::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /app/
async fn serve_index(State(state): State<AppState>) -> Response {
    serve_asset(&state, "")
}

/// GET /app/{*path}
async fn serve_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    serve_asset(&state, &path)
}

/// Create app routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/app", get(serve_index))
        .route("/app/", get(serve_index))
        .route("/app/{*path}", get(serve_file))
}
