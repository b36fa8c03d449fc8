//! Pachca interaction dispatcher.
//!
//! Routes inbound Pachca webhooks purely on their declared `type`/`event`.
//! There is no session state: everything the second half of the promotion
//! flow needs travels inside the button data and the modal's private
//! metadata.
//!
//! | `type`   | `event`  | Handling                                          |
//! |----------|----------|---------------------------------------------------|
//! | `button` | `click`  | Decode button data, open the promote modal        |
//! | `view`   | `submit` | Decode metadata, validate, record the promotion   |
//! | other    | other    | Acknowledged, no side effects                     |

use release_relay_core::{ActionKind, ButtonAction, PromoteForm, ReleaseInfo, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::pachca::{
    ButtonClick, ChatApi, PROMOTE_CALLBACK_ID, ViewSubmit, WebhookEnvelope, build_promote_view,
};

/// A parsed Pachca webhook.
#[derive(Debug, Clone)]
pub enum Interaction {
    /// `type=button`, `event=click`.
    ButtonClick(ButtonClick),
    /// `type=view`, `event=submit`.
    ViewSubmit(ViewSubmit),
    /// Any other webhook. Acknowledged and dropped.
    Ignored {
        webhook_type: String,
        event: String,
    },
}

impl Interaction {
    /// Parse a raw webhook body, choosing the shape from `type`/`event`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::MalformedPayload`] if the body is not a JSON
    /// object, or a recognized kind does not match its shape.
    pub fn parse(body: &[u8]) -> Result<Self, AppError> {
        Self::parse_timestamped(body).map(|(interaction, _)| interaction)
    }

    /// Like [`Interaction::parse`], also returning the envelope's
    /// `webhook_timestamp` for replay checks.
    ///
    /// # Errors
    ///
    /// Same as [`Interaction::parse`].
    pub fn parse_timestamped(body: &[u8]) -> Result<(Self, Option<i64>), AppError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| AppError::MalformedPayload(e.to_string()))?;
        let envelope = WebhookEnvelope::deserialize(&value)
            .map_err(|e| AppError::MalformedPayload(format!("invalid webhook envelope: {e}")))?;

        let interaction = match (envelope.webhook_type.as_str(), envelope.event.as_str()) {
            ("button", "click") => serde_json::from_value(value)
                .map(Self::ButtonClick)
                .map_err(|e| AppError::MalformedPayload(format!("invalid button click: {e}")))?,
            ("view", "submit") => serde_json::from_value(value)
                .map(Self::ViewSubmit)
                .map_err(|e| AppError::MalformedPayload(format!("invalid view submit: {e}")))?,
            _ => Self::Ignored {
                webhook_type: envelope.webhook_type,
                event: envelope.event,
            },
        };

        Ok((interaction, envelope.webhook_timestamp))
    }
}

/// A validated request to widen a release's rollout.
///
/// Performing the promotion is out of scope for the relay; this is what gets
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionRequest {
    pub release: ReleaseInfo,
    pub rollout_percentage: u8,
    pub release_notes: String,
    pub requested_by: Option<UserId>,
}

/// What dispatching an interaction did. Every outcome is acknowledged with
/// 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do for this webhook.
    Ignored,
    /// The promote modal was opened for this release.
    ViewOpened(ReleaseInfo),
    /// A valid promotion was submitted and recorded.
    PromotionRecorded(PromotionRequest),
}

/// Dispatches parsed interactions to their handlers.
pub struct InteractionDispatcher<'a> {
    chat: &'a dyn ChatApi,
}

impl<'a> InteractionDispatcher<'a> {
    /// Create a dispatcher that opens views through the given chat backend.
    #[must_use]
    pub const fn new(chat: &'a dyn ChatApi) -> Self {
        Self { chat }
    }

    /// Handle one interaction.
    ///
    /// # Errors
    ///
    /// - [`AppError::Action`] if button data or metadata cannot be decoded
    /// - [`AppError::Validation`] if the submitted form is invalid
    /// - [`AppError::Upstream`] if opening the view fails
    pub async fn dispatch(&self, interaction: Interaction) -> Result<Outcome, AppError> {
        match interaction {
            Interaction::ButtonClick(click) => self.button_click(&click).await,
            Interaction::ViewSubmit(submit) => Self::view_submit(&submit),
            Interaction::Ignored {
                webhook_type,
                event,
            } => {
                debug!(webhook_type = %webhook_type, event = %event, "Ignoring Pachca webhook");
                Ok(Outcome::Ignored)
            }
        }
    }

    #[instrument(skip(self, click), fields(user_id = ?click.user_id, message_id = ?click.message_id))]
    async fn button_click(&self, click: &ButtonClick) -> Result<Outcome, AppError> {
        let action = ButtonAction::decode(&click.data)?;

        if action.kind != ActionKind::Promote {
            debug!(action = %action.kind, "No handler for button action");
            return Ok(Outcome::Ignored);
        }

        let view = build_promote_view(&action.payload, &click.trigger_id);
        self.chat.open_view(&view).await?;

        info!(
            job_id = %action.payload.job_id,
            version_name = %action.payload.version_name,
            "Promote form opened"
        );

        Ok(Outcome::ViewOpened(action.payload))
    }

    #[instrument(skip(submit), fields(callback_id = %submit.callback_id, user_id = ?submit.user_id))]
    fn view_submit(submit: &ViewSubmit) -> Result<Outcome, AppError> {
        if submit.callback_id != PROMOTE_CALLBACK_ID {
            debug!("No handler for view callback");
            return Ok(Outcome::Ignored);
        }

        let release = ReleaseInfo::from_metadata(&submit.private_metadata)?;
        let form = PromoteForm::parse(&submit.data).map_err(AppError::Validation)?;

        let request = PromotionRequest {
            release,
            rollout_percentage: form.rollout_percentage(),
            release_notes: form.release_notes().to_string(),
            requested_by: submit.user_id,
        };

        info!(
            job_id = %request.release.job_id,
            version_code = request.release.version_code,
            version_name = %request.release.version_name,
            rollout_percentage = request.rollout_percentage,
            requested_by = ?request.requested_by,
            release_notes = %request.release_notes,
            "Promotion requested"
        );

        Ok(Outcome::PromotionRecorded(request))
    }
}
