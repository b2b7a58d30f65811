//! # Compiled-In Limits
//!
//! Hardcoded runtime constants for the dealboard core.
//!
//! These limits are compiled into the binary and are immutable at runtime.
//! They bound metric-table validation so a malformed configuration file
//! cannot blow up aggregation cost.

/// Maximum number of metric definitions in a single table.
///
/// The dashboard renders a fixed set of cards; a table larger than this
/// is a configuration mistake, not a real workload.
pub const MAX_METRICS: usize = 256;

/// Maximum length for a metric label.
pub const MAX_LABEL_LENGTH: usize = 64;

/// Maximum number of stage identifiers in a single group.
pub const MAX_STAGES_PER_GROUP: usize = 64;

/// Maximum length for a custom field name referenced by a metric.
pub const MAX_FIELD_NAME_LENGTH: usize = 128;

/// Pipeline selected when no explicit filter has been applied yet.
pub const DEFAULT_PIPELINE_ID: &str = "9";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_positive() {
        assert!(MAX_METRICS > 0);
        assert!(MAX_LABEL_LENGTH > 0);
        assert!(MAX_STAGES_PER_GROUP > 0);
    }
}
