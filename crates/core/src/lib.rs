//! Release Relay Core - Shared types library.
//!
//! This crate provides the types used by the `release-relay` server:
//! - [`ReleaseInfo`] - the release payload carried across the chat round trip
//! - [`ButtonAction`] - encoding/decoding of opaque button data
//! - [`PromoteForm`] - validation of the promote modal submission
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Everything the relay needs to survive the stateless gap between
//! a button click and a form submission lives here.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, release payload, action codec, and form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
