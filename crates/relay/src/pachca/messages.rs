//! Pachca message builders for the release promotion flow.
//!
//! Provides factory functions for:
//! - The build-success notification with its "Promote release" button
//! - The promote modal opened when that button is clicked

use release_relay_core::{ActionKind, ButtonAction, ChatId, ReleaseInfo};
use release_relay_core::types::form::{RELEASE_NOTES, ROLLOUT_PERCENTAGE};

use super::types::{
    Button, EntityType, InputBlock, Message, MessageRequest, View, ViewBlock, ViewRequest,
    ViewType,
};

/// Callback ID of the promote modal, echoed back on submit.
pub const PROMOTE_CALLBACK_ID: &str = "promote";

/// Build the notification posted when a release reaches the internal track.
///
/// The single button carries the full release so the click handler needs no
/// lookup.
#[must_use]
pub fn build_release_message(release: &ReleaseInfo, chat_id: ChatId) -> MessageRequest {
    let content = format!(
        "Release {} ({}) uploaded to Google Play Internal. Built by job {}.",
        release.version_name, release.version_code, release.job_id
    );

    MessageRequest {
        message: Message {
            entity_type: EntityType::Discussion,
            entity_id: chat_id,
            content,
            buttons: vec![vec![Button {
                text: "Promote release".to_string(),
                data: ButtonAction::encode(ActionKind::Promote, release),
            }]],
        },
    }
}

/// Build the promote modal for a clicked release button.
///
/// The release rides along as private metadata and comes back with the
/// submission.
#[must_use]
pub fn build_promote_view(release: &ReleaseInfo, trigger_id: &str) -> ViewRequest {
    ViewRequest {
        trigger_id: trigger_id.to_string(),
        view_type: ViewType::Modal,
        callback_id: PROMOTE_CALLBACK_ID.to_string(),
        private_metadata: release.to_metadata(),
        view: View {
            title: "Promote Release".to_string(),
            close_text: Some("Cancel".to_string()),
            submit_text: Some("Promote".to_string()),
            blocks: vec![
                ViewBlock::Header {
                    text: format!(
                        "Promote {} ({}) from job {}",
                        release.version_name, release.version_code, release.job_id
                    ),
                },
                ViewBlock::Input(InputBlock {
                    name: ROLLOUT_PERCENTAGE.to_string(),
                    label: "Rollout percentage".to_string(),
                    placeholder: Some("Enter percentage (0-100)".to_string()),
                    min_length: Some(1),
                    max_length: Some(3),
                    required: true,
                    hint: Some(
                        "Percentage of users who will receive this update (0-100)".to_string(),
                    ),
                    ..InputBlock::default()
                }),
                ViewBlock::Input(InputBlock {
                    name: RELEASE_NOTES.to_string(),
                    label: "Release notes".to_string(),
                    placeholder: Some("Enter release notes".to_string()),
                    multiline: true,
                    max_length: Some(500),
                    required: true,
                    ..InputBlock::default()
                }),
            ],
        },
    }
}
