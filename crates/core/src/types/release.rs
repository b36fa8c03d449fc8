//! Release payload produced by a successful CI build.

use serde::{Deserialize, Serialize};

use super::action::ActionError;
use super::id::JobId;

/// A build that finished uploading to the internal testing track.
///
/// This is the only state the relay needs between a button click and the
/// follow-up form submission. It travels verbatim inside button data and
/// modal private metadata, so its JSON shape is part of the wire contract:
/// `{"job_id":..,"version_code":..,"version_name":..}` in that key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// CI job that produced the build.
    pub job_id: JobId,
    /// Monotonic store version code.
    pub version_code: i64,
    /// Human-readable version name (e.g. `1.0.1`).
    pub version_name: String,
}

impl ReleaseInfo {
    /// Create a new release payload.
    #[must_use]
    pub fn new(job_id: JobId, version_code: i64, version_name: impl Into<String>) -> Self {
        Self {
            job_id,
            version_code,
            version_name: version_name.into(),
        }
    }

    /// Serialize for use as modal private metadata.
    #[must_use]
    pub fn to_metadata(&self) -> String {
        // A struct of integers and a string always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse modal private metadata back into a release.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidPayload`] if the metadata is not JSON of
    /// the expected shape. The relay produces this string itself, so a failure
    /// here means the metadata was tampered with or truncated upstream.
    pub fn from_metadata(metadata: &str) -> Result<Self, ActionError> {
        serde_json::from_str(metadata).map_err(|e| ActionError::InvalidPayload(e.to_string()))
    }
}
