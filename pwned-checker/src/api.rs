//! The query HTTP API.
//!
//! - `POST /v1/check/password` takes a plaintext password, SHA-1s it and
//!   checks the high 64 bits against the set.
//! - `POST /v1/check/hash` takes a 40-character hex SHA-1 directly, for
//!   clients that never want to send a plaintext over the wire.
//! - `GET /v1/health` for load balancers.
//!
//! A `false` verdict is definitive; `true` is wrong with probability at
//! most the database's configured 1-in-P rate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use pwned_gcs::{sha1_to_u64, u64_from_sha1_hex, Reader};

/// Shared state: the reader is immutable after open and safe to hit from
/// any number of concurrent handlers.
pub struct AppState {
    pub reader: Reader,
}

#[derive(Debug, Deserialize)]
struct PasswordRequest {
    password: String,
}

#[derive(Debug, Deserialize)]
struct HashRequest {
    hash: String,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    pwned: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/check/password", post(check_password))
        .route("/v1/check/hash", post(check_hash))
        .route("/v1/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn check_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PasswordRequest>,
) -> Response {
    let hash = sha1_to_u64(&request.password);
    verdict(&state, hash)
}

async fn check_hash(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HashRequest>,
) -> Response {
    match u64_from_sha1_hex(request.hash.trim()) {
        Ok(hash) => verdict(&state, hash),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response(),
    }
}

fn verdict(state: &AppState, hash: u64) -> Response {
    match state.reader.exists(hash) {
        Ok(pwned) => (StatusCode::OK, Json(CheckResponse { pwned })).into_response(),
        Err(e) => {
            error!("lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: e.to_string() }),
            )
                .into_response()
        }
    }
}

async fn health() -> Response {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response()
}
