//! Button action codec.
//!
//! A chat button can only carry a single opaque string, echoed back verbatim
//! when the button is clicked. The relay uses it to smuggle both the action
//! to perform and the release it applies to:
//!
//! ```text
//! promote|{"job_id":12345,"version_code":1001,"version_name":"1.0.1"}
//! ^^^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! kind    JSON payload (may itself contain `|`)
//! ```
//!
//! Decoding splits on the first separator only. Action kinds are short
//! lowercase identifiers and never contain it.
//!
//! The older `promote:12345` form carried only a job ID. It has no `|` and is
//! rejected as malformed.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::release::ReleaseInfo;

/// Separator between the action kind and its JSON payload.
pub const SEPARATOR: char = '|';

/// Errors that can occur when decoding button data or modal metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// No separator, or the kind prefix is not a known action.
    #[error("malformed action: {0}")]
    MalformedAction(String),
    /// The payload is not JSON of the expected shape.
    #[error("invalid action payload: {0}")]
    InvalidPayload(String),
}

/// Actions a release button can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Widen the staged rollout of a release.
    Promote,
    /// Halt a staged rollout. Buttons may carry it, but nothing handles it yet.
    Halt,
}

impl ActionKind {
    /// The wire identifier for this action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Promote => "promote",
            Self::Halt => "halt",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "promote" => Ok(Self::Promote),
            "halt" => Ok(Self::Halt),
            _ => Err(ActionError::MalformedAction(format!(
                "unknown action kind: {s}"
            ))),
        }
    }
}

/// A decoded button click: which action, for which release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonAction {
    pub kind: ActionKind,
    pub payload: ReleaseInfo,
}

impl ButtonAction {
    /// Create a new button action.
    #[must_use]
    pub const fn new(kind: ActionKind, payload: ReleaseInfo) -> Self {
        Self { kind, payload }
    }

    /// Encode an action and its payload into button data.
    #[must_use]
    pub fn encode(kind: ActionKind, payload: &ReleaseInfo) -> String {
        format!("{kind}{SEPARATOR}{}", payload.to_metadata())
    }

    /// Decode button data produced by [`ButtonAction::encode`].
    ///
    /// # Errors
    ///
    /// - [`ActionError::MalformedAction`] if there is no separator or the
    ///   kind is unknown
    /// - [`ActionError::InvalidPayload`] if the payload is not a valid
    ///   [`ReleaseInfo`]
    pub fn decode(raw: &str) -> Result<Self, ActionError> {
        let (kind, payload) = raw.split_once(SEPARATOR).ok_or_else(|| {
            ActionError::MalformedAction(format!("missing '{SEPARATOR}' separator"))
        })?;

        let kind: ActionKind = kind.parse()?;
        let payload = ReleaseInfo::from_metadata(payload)?;

        Ok(Self { kind, payload })
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(self.kind, &self.payload))
    }
}

impl std::str::FromStr for ButtonAction {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
