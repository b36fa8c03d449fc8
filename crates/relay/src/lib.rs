//! Release relay library.
//!
//! Bridges CI build events to a Pachca chat and back:
//! - a successful build becomes a pinned release message with a
//!   "Promote release" button
//! - the button opens a promote form
//! - the submitted form is validated and recorded as a promotion request
//!
//! The relay keeps no state between requests. Release identity round-trips
//! through button data and modal metadata.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub mod config;
pub mod error;
pub mod pachca;
pub mod routes;
pub mod services;
pub mod state;

use state::AppState;

/// Build the relay application with tracing and Sentry layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
