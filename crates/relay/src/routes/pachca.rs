//! Pachca webhook handler for button clicks and form submits.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::pachca::{verify_signature, verify_timestamp};
use crate::services::{Interaction, InteractionDispatcher};
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "Pachca-Signature";

/// Handle a Pachca webhook.
///
/// When a signing secret is configured, the signature is checked against the
/// raw body before anything is parsed, and `webhook_timestamp` (if sent) must
/// be recent.
#[instrument(skip(state, headers, body))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signing_secret = state.config().pachca.signing_secret.as_ref();

    if let Some(secret) = signing_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing signature header".into()))?;

        verify_signature(secret, &body, signature)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    }

    let (interaction, timestamp) = Interaction::parse_timestamped(&body)?;

    if let (Some(_), Some(timestamp)) = (signing_secret, timestamp) {
        verify_timestamp(timestamp).map_err(|e| AppError::Unauthorized(e.to_string()))?;
    }

    let outcome = InteractionDispatcher::new(state.chat())
        .dispatch(interaction)
        .await?;
    debug!(?outcome, "Pachca webhook handled");

    Ok(StatusCode::OK)
}
