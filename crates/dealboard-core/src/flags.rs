//! # Flag Normalization
//!
//! The CRM stores boolean custom fields in heterogeneous encodings: the
//! string `"Y"`, the string `"1"`, or a real JSON boolean, depending on
//! field type and API version. This module normalizes all of them to a
//! single `bool` at the data-ingestion boundary, so the rest of the core
//! never sees the union type.

use serde::{Deserialize, Serialize};

// =============================================================================
// TRUTHY PREDICATE
// =============================================================================

/// Interpret a CRM string flag value.
///
/// `"Y"` and `"1"` are set; everything else (including `"N"`, `"0"`, and
/// empty strings) is not.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    value == "Y" || value == "1"
}

// =============================================================================
// RAW FLAG UNION
// =============================================================================

/// A flag value as it appears on the wire: either a JSON boolean or a
/// string encoding.
///
/// Deserialized untagged so both `"UF_X": true` and `"UF_X": "Y"` parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    /// Native boolean encoding.
    Bool(bool),
    /// String encoding (`"Y"`, `"1"`, `"N"`, ...).
    Text(String),
}

impl RawFlag {
    /// Normalize to a single boolean.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Text(s) => is_truthy(s),
        }
    }

    /// The raw textual form, used when the same field doubles as a
    /// value-match target.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Bool(true) => "Y".to_string(),
            Self::Bool(false) => "N".to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_accepts_y_and_one() {
        assert!(is_truthy("Y"));
        assert!(is_truthy("1"));
    }

    #[test]
    fn truthy_rejects_everything_else() {
        assert!(!is_truthy("N"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("y"));
        assert!(!is_truthy("yes"));
        assert!(!is_truthy("true"));
    }

    #[test]
    fn raw_flag_normalizes_all_encodings() {
        assert!(RawFlag::Bool(true).is_set());
        assert!(RawFlag::Text("Y".to_string()).is_set());
        assert!(RawFlag::Text("1".to_string()).is_set());
        assert!(!RawFlag::Bool(false).is_set());
        assert!(!RawFlag::Text("N".to_string()).is_set());
    }

    #[test]
    fn raw_flag_deserializes_untagged() {
        let from_bool: RawFlag = serde_json::from_str("true").expect("bool");
        let from_text: RawFlag = serde_json::from_str("\"Y\"").expect("text");
        assert!(from_bool.is_set());
        assert!(from_text.is_set());
    }

    #[test]
    fn raw_flag_text_roundtrip() {
        assert_eq!(RawFlag::Bool(true).as_text(), "Y");
        assert_eq!(RawFlag::Text("1635".to_string()).as_text(), "1635");
    }
}
