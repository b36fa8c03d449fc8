//! Webhook handling services.
//!
//! # Services
//!
//! - `notifier` - Posts and pins the release message for a successful CI build
//! - `dispatcher` - Routes Pachca button clicks and view submits

pub mod dispatcher;
pub mod notifier;

pub use dispatcher::{Interaction, InteractionDispatcher, Outcome, PromotionRequest};
pub use notifier::{BuildEvent, BuildNotifier, NotifyOutcome};
