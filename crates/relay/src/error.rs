//! Unified error handling for the relay.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use release_relay_core::{ActionError, ValidationErrors};
use serde_json::json;
use thiserror::Error;

use crate::pachca::PachcaError;

/// Application-level error type for webhook handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Inbound body is not JSON or does not match the expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Button data or private metadata could not be decoded.
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// Form fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Webhook signature or token check failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Pachca API call failed.
    #[error("Pachca error: {0}")]
    Upstream(#[from] PachcaError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(_) | Self::Internal(_) => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Relay request error"
                );
            }
            // The relay produces this data itself, so a decode failure means
            // tampering or a bug worth looking at.
            Self::Action(_) => tracing::warn!(error = %self, "Undecodable action data"),
            Self::Unauthorized(_) => tracing::warn!(error = %self, "Rejected webhook"),
            Self::MalformedPayload(_) | Self::Validation(_) => {
                tracing::debug!(error = %self, "Client error");
            }
        }

        let status = match &self {
            Self::MalformedPayload(_) | Self::Action(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            // Pachca renders these next to the offending inputs.
            Self::Validation(errors) => (status, Json(json!({ "errors": errors }))).into_response(),
            // Don't expose upstream or internal details to callers
            Self::Upstream(_) => (status, "External service error").into_response(),
            Self::Internal(_) => (status, "Internal server error").into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}
