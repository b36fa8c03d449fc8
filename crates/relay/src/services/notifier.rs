//! Release notification for successful CI builds.
//!
//! The CI job posts `{event, result, data}` once the build is uploaded to the
//! internal track. Only `build`/`success` events are acted on: the relay
//! posts a release message with a "Promote release" button to the internal
//! chat, then pins it.

use release_relay_core::{ChatId, MessageId, ReleaseInfo};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::pachca::{ChatApi, build_release_message};

/// Inbound CI webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildEvent {
    /// Event name (`build`, `deploy`, ...).
    #[serde(default)]
    pub event: String,
    /// Outcome (`success`, `failed`, ...).
    #[serde(default)]
    pub result: String,
    /// Event-specific payload. Parsed only for successful builds.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl BuildEvent {
    /// Parse a raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MalformedPayload`] if the body is not a valid event.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(body).map_err(|e| AppError::MalformedPayload(e.to_string()))
    }

    /// Whether this event should produce a release notification.
    #[must_use]
    pub fn is_build_success(&self) -> bool {
        self.event == "build" && self.result == "success"
    }

    /// Extract the release from a build event's data.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MalformedPayload`] if `data` is not a release.
    pub fn release(&self) -> Result<ReleaseInfo, AppError> {
        ReleaseInfo::deserialize(&self.data)
            .map_err(|e| AppError::MalformedPayload(format!("invalid build data: {e}")))
    }
}

/// What handling a CI event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Not a successful build; nothing was sent.
    Ignored,
    /// Release message posted and pinned.
    Notified {
        release: ReleaseInfo,
        message_id: MessageId,
    },
}

/// Posts release notifications to the internal chat.
pub struct BuildNotifier<'a> {
    chat: &'a dyn ChatApi,
    chat_id: ChatId,
}

impl<'a> BuildNotifier<'a> {
    /// Create a notifier targeting the given chat.
    #[must_use]
    pub const fn new(chat: &'a dyn ChatApi, chat_id: ChatId) -> Self {
        Self { chat, chat_id }
    }

    /// Handle a CI event.
    ///
    /// Send and pin run sequentially with no retry. If pinning fails the
    /// message stays posted but unpinned, and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`AppError::MalformedPayload`] if a build-success event has bad data
    /// - [`AppError::Upstream`] if Pachca rejects either call
    #[instrument(skip(self, event), fields(event = %event.event, result = %event.result))]
    pub async fn handle(&self, event: &BuildEvent) -> Result<NotifyOutcome, AppError> {
        if !event.is_build_success() {
            debug!("Ignoring CI event");
            return Ok(NotifyOutcome::Ignored);
        }

        let release = event.release()?;
        let request = build_release_message(&release, self.chat_id);

        let message_id = self.chat.send_message(&request).await?;
        self.chat.pin_message(message_id).await?;

        info!(
            job_id = %release.job_id,
            version_name = %release.version_name,
            version_code = release.version_code,
            message_id = %message_id,
            "Release notification posted"
        );

        Ok(NotifyOutcome::Notified {
            release,
            message_id,
        })
    }
}
