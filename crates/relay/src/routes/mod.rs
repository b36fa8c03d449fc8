//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health              - Liveness check
//!
//! # CI
//! POST /gitlab/webhook      - Build events, posts the release message
//!
//! # Pachca
//! POST /pachca/webhook      - Button clicks and view submits
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod gitlab;
pub mod pachca;

/// Build all relay routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/gitlab/webhook", post(gitlab::handle_webhook))
        .route("/pachca/webhook", post(pachca::handle_webhook))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Pachca.
async fn health() -> &'static str {
    "ok"
}
