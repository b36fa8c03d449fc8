//! Core types for Release Relay.

pub mod action;
pub mod form;
pub mod id;
pub mod release;

pub use action::{ActionError, ActionKind, ButtonAction, SEPARATOR};
pub use form::{FieldValue, FormFields, PromoteForm, ValidationErrors};
pub use id::*;
pub use release::ReleaseInfo;
