//! Pachca integration for release notifications and promotion forms.
//!
//! This module provides:
//! - [`ChatApi`], the outbound contract, and [`PachcaClient`] implementing it
//! - Message, view and webhook types
//! - Message builders for the release flow
//! - Webhook signature verification
//!
//! # Flow
//!
//! 1. CI reports a successful build, a release message with a button is posted and pinned
//! 2. Someone clicks "Promote release"
//! 3. Webhook handler decodes the button data and opens the promote modal
//! 4. The modal is submitted, the handler validates it and records the promotion

mod client;
mod error;
pub mod messages;
mod types;

pub use client::{ChatApi, PachcaClient, verify_signature, verify_timestamp};
pub(crate) use client::constant_time_compare;
pub use error::PachcaError;
pub use messages::{PROMOTE_CALLBACK_ID, build_promote_view, build_release_message};
pub use types::{
    Button, ButtonClick, EntityType, InputBlock, Message, MessageData, MessageRequest,
    MessageResponse, View, ViewBlock, ViewRequest, ViewSubmit, ViewType, WebhookEnvelope,
};
