//! Pachca API types for messages, modal views and webhooks.
//!
//! These types represent the subset of the Pachca API the relay needs:
//! posting a message with buttons, opening a modal view, and receiving
//! button-click and view-submit webhooks.
//!
//! See: <https://crm.pachca.com/dev/>

use release_relay_core::{ChatId, FormFields, MessageId, UserId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

/// Request body for `POST /messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: Message,
}

/// Outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Kind of entity the message is posted to.
    pub entity_type: EntityType,
    /// Chat (or user/thread) ID.
    pub entity_id: ChatId,
    /// Message text.
    pub content: String,
    /// Button rows. Each inner vec is one row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Vec<Button>>,
}

/// Target entity for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A chat or channel.
    Discussion,
    /// A thread under a message.
    Thread,
    /// A direct message to a user.
    User,
}

/// Interactive message button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Button label.
    pub text: String,
    /// Opaque data echoed back in the click webhook.
    pub data: String,
}

/// Response from posting a message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub data: MessageData,
}

/// Created message.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageData {
    /// Message ID, used for pinning.
    pub id: MessageId,
}

// =============================================================================
// Views
// =============================================================================

/// Request body for `POST /views/open`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    /// Trigger ID from the button click that opens this view.
    pub trigger_id: String,
    /// View presentation.
    #[serde(rename = "type")]
    pub view_type: ViewType,
    /// Echoed back as `callback_id` on submit.
    pub callback_id: String,
    /// Echoed back verbatim as `private_metadata` on submit.
    pub private_metadata: String,
    /// View contents.
    pub view: View,
}

/// How a view is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Modal,
}

/// Modal view contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_text: Option<String>,
    pub blocks: Vec<ViewBlock>,
}

/// View block types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewBlock {
    /// Large heading text.
    Header { text: String },
    /// Text input.
    Input(InputBlock),
}

/// Text input block.
///
/// `min_length`/`max_length` are rendered by the client as input limits.
/// They are hints only; submitted values are validated server-side anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBlock {
    /// Field name in the submit payload.
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

// =============================================================================
// Webhooks
// =============================================================================

/// Common envelope of every Pachca webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    /// Webhook type (e.g. `button`, `view`, `message`).
    #[serde(rename = "type", default)]
    pub webhook_type: String,
    /// Event within the type (e.g. `click`, `submit`, `new`).
    #[serde(default)]
    pub event: String,
    /// Unix seconds when Pachca sent the webhook.
    #[serde(default)]
    pub webhook_timestamp: Option<i64>,
}

/// Button click webhook (`type=button`, `event=click`).
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonClick {
    /// Trigger ID for opening a view in response.
    #[serde(default)]
    pub trigger_id: String,
    /// Button data as set when the message was posted.
    pub data: String,
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub chat_id: Option<ChatId>,
}

/// View submit webhook (`type=view`, `event=submit`).
#[derive(Debug, Clone, Deserialize)]
pub struct ViewSubmit {
    /// Callback ID the view was opened with.
    #[serde(default)]
    pub callback_id: String,
    /// Private metadata the view was opened with.
    #[serde(default)]
    pub private_metadata: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Submitted input values keyed by input name.
    #[serde(default)]
    pub data: FormFields,
}
