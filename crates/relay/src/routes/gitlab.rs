//! CI webhook handler.
//!
//! Receives build events from the pipeline and posts release notifications.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::pachca::constant_time_compare;
use crate::services::{BuildEvent, BuildNotifier};
use crate::state::AppState;

/// Header carrying the shared webhook token.
pub const TOKEN_HEADER: &str = "X-Gitlab-Token";

/// Handle a CI webhook.
///
/// Non-build or failed events are acknowledged without side effects.
#[instrument(skip(state, headers, body))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if let Some(expected) = &state.config().gitlab_webhook_token {
        let token = headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing webhook token".into()))?;

        if !constant_time_compare(token, expected.expose_secret()) {
            return Err(AppError::Unauthorized("Invalid webhook token".into()));
        }
        debug!("CI webhook token verified");
    }

    let event = BuildEvent::parse(&body)?;

    BuildNotifier::new(state.chat(), state.config().pachca.internal_chat_id)
        .handle(&event)
        .await?;

    Ok(StatusCode::OK)
}
