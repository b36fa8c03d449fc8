//! Promote form submission and its validation rules.
//!
//! Modal submissions arrive as an untyped map from field name to JSON value.
//! [`FieldValue`] captures every shape a value can take so that a wrong type
//! is an ordinary validation failure instead of a deserialization error.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Name of the rollout percentage input.
pub const ROLLOUT_PERCENTAGE: &str = "rollout_percentage";
/// Name of the release notes input.
pub const RELEASE_NOTES: &str = "release_notes";

const REQUIRED: &str = "required";
const NOT_A_NUMBER: &str = "must be a number";
const OUT_OF_RANGE: &str = "must be between 0 and 100";

/// Untyped form field value as delivered by the chat platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Arrays and objects.
    Other(serde_json::Value),
}

impl FieldValue {
    /// Returns the value if it is a string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Raw submitted fields, keyed by input name.
pub type FormFields = HashMap<String, FieldValue>;

/// Per-field validation messages. Empty means valid.
///
/// Serializes as a flat JSON object (`{"field": "message"}`), which is the
/// shape the chat platform renders inline next to the offending inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field, replacing any earlier one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Returns the error for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns `true` if no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields that failed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// A validated promote form.
///
/// Only obtainable through [`PromoteForm::parse`], so holding one means every
/// rule has passed.
///
/// ## Constraints
///
/// - `rollout_percentage`: base-10 integer string in `0..=100`
/// - `release_notes`: non-empty, at most 500 characters (Unicode scalar
///   values, not bytes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromoteForm {
    rollout_percentage: u8,
    release_notes: String,
}

impl PromoteForm {
    /// Maximum release notes length in characters.
    pub const MAX_NOTES_LENGTH: usize = 500;

    /// Maximum rollout percentage.
    pub const MAX_ROLLOUT: u8 = 100;

    /// Check every field and collect all failures.
    ///
    /// Unknown fields are ignored. A missing field and a field of the wrong
    /// type are both reported as `"required"`.
    #[must_use]
    pub fn validate(fields: &FormFields) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if let Err(message) = rollout_percentage(fields) {
            errors.add(ROLLOUT_PERCENTAGE, message);
        }
        if let Err(message) = release_notes(fields) {
            errors.add(RELEASE_NOTES, message);
        }

        errors
    }

    /// Validate and build a typed form.
    ///
    /// # Errors
    ///
    /// Returns the full [`ValidationErrors`] set if any field fails.
    pub fn parse(fields: &FormFields) -> Result<Self, ValidationErrors> {
        match (rollout_percentage(fields), release_notes(fields)) {
            (Ok(rollout_percentage), Ok(release_notes)) => Ok(Self {
                rollout_percentage,
                release_notes: release_notes.to_owned(),
            }),
            _ => Err(Self::validate(fields)),
        }
    }

    /// Target rollout percentage.
    #[must_use]
    pub const fn rollout_percentage(&self) -> u8 {
        self.rollout_percentage
    }

    /// Release notes as entered.
    #[must_use]
    pub fn release_notes(&self) -> &str {
        &self.release_notes
    }
}

fn required_text<'a>(fields: &'a FormFields, name: &str) -> Result<&'a str, String> {
    match fields.get(name).and_then(FieldValue::as_text) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(REQUIRED.to_owned()),
    }
}

fn rollout_percentage(fields: &FormFields) -> Result<u8, String> {
    let raw = required_text(fields, ROLLOUT_PERCENTAGE)?;
    let value: i64 = raw.parse().map_err(|_| NOT_A_NUMBER.to_owned())?;

    u8::try_from(value)
        .ok()
        .filter(|v| *v <= PromoteForm::MAX_ROLLOUT)
        .ok_or_else(|| OUT_OF_RANGE.to_owned())
}

fn release_notes(fields: &FormFields) -> Result<&str, String> {
    let notes = required_text(fields, RELEASE_NOTES)?;

    if notes.chars().count() > PromoteForm::MAX_NOTES_LENGTH {
        return Err(format!(
            "must be at most {} characters",
            PromoteForm::MAX_NOTES_LENGTH
        ));
    }

    Ok(notes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> FormFields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_submission() {
        let form = PromoteForm::parse(&fields(json!({
            "rollout_percentage": "25",
            "release_notes": "Bug fixes"
        })))
        .unwrap();

        assert_eq!(form.rollout_percentage(), 25);
        assert_eq!(form.release_notes(), "Bug fixes");
    }

    #[test]
    fn test_range_bounds_inclusive() {
        for pct in ["0", "100", "+50"] {
            let errors = PromoteForm::validate(&fields(json!({
                "rollout_percentage": pct,
                "release_notes": "ok"
            })));
            assert!(errors.is_empty(), "{pct} should be valid");
        }
    }

    #[test]
    fn test_out_of_range_reports_only_range_error() {
        for pct in ["101", "150", "-1", "999"] {
            let errors = PromoteForm::validate(&fields(json!({
                "rollout_percentage": pct,
                "release_notes": "ok"
            })));
            assert_eq!(errors.len(), 1, "{pct}");
            assert_eq!(
                errors.get(ROLLOUT_PERCENTAGE),
                Some("must be between 0 and 100")
            );
            assert_eq!(errors.get(RELEASE_NOTES), None);
        }
    }

    #[test]
    fn test_not_a_number() {
        for pct in ["abc", "12.5", " 50", "50%", "99999999999999999999"] {
            let errors = PromoteForm::validate(&fields(json!({
                "rollout_percentage": pct,
                "release_notes": "ok"
            })));
            assert_eq!(errors.get(ROLLOUT_PERCENTAGE), Some("must be a number"), "{pct}");
        }
    }

    #[test]
    fn test_missing_and_wrong_type_are_required() {
        let errors = PromoteForm::validate(&FormFields::new());
        assert_eq!(errors.get(ROLLOUT_PERCENTAGE), Some("required"));
        assert_eq!(errors.get(RELEASE_NOTES), Some("required"));

        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": 50,
            "release_notes": ["not", "a", "string"]
        })));
        assert_eq!(errors.get(ROLLOUT_PERCENTAGE), Some("required"));
        assert_eq!(errors.get(RELEASE_NOTES), Some("required"));

        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": null,
            "release_notes": true
        })));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_empty_strings_are_required() {
        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": "",
            "release_notes": ""
        })));
        assert_eq!(errors.get(ROLLOUT_PERCENTAGE), Some("required"));
        assert_eq!(errors.get(RELEASE_NOTES), Some("required"));
    }

    #[test]
    fn test_release_notes_length_boundary() {
        let at_limit = "a".repeat(500);
        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": "10",
            "release_notes": at_limit
        })));
        assert!(errors.is_empty());

        let over_limit = "a".repeat(501);
        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": "10",
            "release_notes": over_limit
        })));
        assert_eq!(
            errors.get(RELEASE_NOTES),
            Some("must be at most 500 characters")
        );
        assert_eq!(errors.get(ROLLOUT_PERCENTAGE), None);
    }

    #[test]
    fn test_release_notes_counts_chars_not_bytes() {
        // 500 two-byte characters is 1000 bytes but still within the limit.
        let notes = "é".repeat(500);
        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": "10",
            "release_notes": notes
        })));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": "10",
            "release_notes": "ok",
            "track": "production",
            "extra": {"nested": true}
        })));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_errors_collected_not_short_circuited() {
        let errors = PromoteForm::validate(&fields(json!({
            "rollout_percentage": "abc",
            "release_notes": "x".repeat(600)
        })));
        assert_eq!(errors.len(), 2);
        assert!(PromoteForm::parse(&fields(json!({}))).is_err());
    }

    #[test]
    fn test_validation_errors_serialize_flat() {
        let mut errors = ValidationErrors::new();
        errors.add(ROLLOUT_PERCENTAGE, "must be between 0 and 100");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"rollout_percentage": "must be between 0 and 100"})
        );
        assert_eq!(
            errors.to_string(),
            "rollout_percentage: must be between 0 and 100"
        );
    }

    #[test]
    fn test_field_value_shapes() {
        let parsed = fields(json!({
            "a": null, "b": true, "c": 1, "d": "x", "e": [1], "f": {}
        }));
        assert_eq!(parsed.get("a"), Some(&FieldValue::Null));
        assert_eq!(parsed.get("b"), Some(&FieldValue::Bool(true)));
        assert!(matches!(parsed.get("c"), Some(FieldValue::Number(_))));
        assert_eq!(parsed.get("d"), Some(&FieldValue::from("x")));
        assert!(matches!(parsed.get("e"), Some(FieldValue::Other(_))));
        assert!(matches!(parsed.get("f"), Some(FieldValue::Other(_))));
    }
}
