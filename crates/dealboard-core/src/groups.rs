//! # Metric Table
//!
//! Named metric definitions that bucket deals for counting and summing.
//!
//! A metric table is static configuration: it maps a label (the card or
//! chart segment on the dashboard) to a predicate over deals. Stage
//! groups map one label to one or more stage identifiers; flag and field
//! metrics match on custom CRM fields.
//!
//! Tables can be loaded from TOML (`[[metric]]` entries) or built from
//! the compiled-in default table that mirrors the production dashboard.

use crate::primitives::{
    MAX_FIELD_NAME_LENGTH, MAX_LABEL_LENGTH, MAX_METRICS, MAX_STAGES_PER_GROUP,
};
use crate::types::{DealboardError, StageId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// METRIC KIND
// =============================================================================

/// The predicate a metric applies to the filtered deal list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricKind {
    /// Count of all filtered deals.
    Total,
    /// Count of deals whose stage id is in the group's set.
    StageCount {
        /// Stage identifiers belonging to this group.
        stages: BTreeSet<StageId>,
    },
    /// Exact decimal sum of opportunity amounts over deals in the set.
    StageSum {
        /// Stage identifiers belonging to this group.
        stages: BTreeSet<StageId>,
    },
    /// Count of deals whose normalized boolean flag is set.
    FlagCount {
        /// CRM custom field name, e.g. `"UF_CRM_PREPAYMENT_INVOICE"`.
        field: String,
    },
    /// Count of deals whose raw custom field equals a literal value.
    FieldEquals {
        /// CRM custom field name.
        field: String,
        /// Literal value to match, e.g. a status enumeration id.
        value: String,
    },
    /// Count of deals with a non-empty custom field.
    FieldPresent {
        /// CRM custom field name.
        field: String,
    },
}

// =============================================================================
// METRIC DEFINITION
// =============================================================================

/// A single labeled metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDef {
    /// Snapshot key; also the card label on the dashboard.
    pub label: String,
    /// The predicate this metric applies.
    #[serde(flatten)]
    pub kind: MetricKind,
}

impl MetricDef {
    /// Create a metric definition.
    #[must_use]
    pub fn new(label: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

// =============================================================================
// METRIC SET
// =============================================================================

/// An ordered table of metric definitions.
///
/// Serde shape matches a TOML file of `[[metric]]` entries:
///
/// ```toml
/// [[metric]]
/// label = "closed_total"
/// kind = "stage_sum"
/// stages = ["C9:WON"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSet {
    /// The metric definitions, in declaration order.
    #[serde(rename = "metric")]
    metrics: Vec<MetricDef>,
}

impl MetricSet {
    /// Build a table from a list of definitions, validating it.
    pub fn new(metrics: Vec<MetricDef>) -> Result<Self, DealboardError> {
        let set = Self { metrics };
        set.validate()?;
        Ok(set)
    }

    /// Iterate definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricDef> {
        self.metrics.iter()
    }

    /// Number of definitions in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Validate the table.
    ///
    /// A table is valid if:
    /// - It holds at most `MAX_METRICS` definitions
    /// - Labels are non-empty, unique, and within `MAX_LABEL_LENGTH`
    /// - Stage groups are non-empty and within `MAX_STAGES_PER_GROUP`
    /// - Field names are non-empty and within `MAX_FIELD_NAME_LENGTH`
    pub fn validate(&self) -> Result<(), DealboardError> {
        if self.metrics.len() > MAX_METRICS {
            return Err(DealboardError::InvalidMetric(format!(
                "table holds {} metrics, maximum is {}",
                self.metrics.len(),
                MAX_METRICS
            )));
        }

        let mut seen = BTreeSet::new();
        for def in &self.metrics {
            if def.label.is_empty() {
                return Err(DealboardError::InvalidMetric(
                    "metric label must be non-empty".to_string(),
                ));
            }
            if def.label.len() > MAX_LABEL_LENGTH {
                return Err(DealboardError::InvalidMetric(format!(
                    "label '{}' exceeds {} bytes",
                    def.label, MAX_LABEL_LENGTH
                )));
            }
            if !seen.insert(def.label.as_str()) {
                return Err(DealboardError::InvalidMetric(format!(
                    "duplicate label '{}'",
                    def.label
                )));
            }

            match &def.kind {
                MetricKind::Total => {}
                MetricKind::StageCount { stages } | MetricKind::StageSum { stages } => {
                    if stages.is_empty() {
                        return Err(DealboardError::InvalidMetric(format!(
                            "stage group '{}' has no stages",
                            def.label
                        )));
                    }
                    if stages.len() > MAX_STAGES_PER_GROUP {
                        return Err(DealboardError::InvalidMetric(format!(
                            "stage group '{}' exceeds {} stages",
                            def.label, MAX_STAGES_PER_GROUP
                        )));
                    }
                }
                MetricKind::FlagCount { field }
                | MetricKind::FieldPresent { field }
                | MetricKind::FieldEquals { field, .. } => {
                    if field.is_empty() {
                        return Err(DealboardError::InvalidMetric(format!(
                            "metric '{}' references an empty field name",
                            def.label
                        )));
                    }
                    if field.len() > MAX_FIELD_NAME_LENGTH {
                        return Err(DealboardError::InvalidMetric(format!(
                            "metric '{}' field name exceeds {} bytes",
                            def.label, MAX_FIELD_NAME_LENGTH
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Custom field names referenced by flag and field metrics.
    ///
    /// The deal fetch uses this to build its server-side `select` list,
    /// so a configured table automatically pulls the fields it needs.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<&str> {
        self.metrics
            .iter()
            .filter_map(|def| match &def.kind {
                MetricKind::FlagCount { field }
                | MetricKind::FieldPresent { field }
                | MetricKind::FieldEquals { field, .. } => Some(field.as_str()),
                MetricKind::Total
                | MetricKind::StageCount { .. }
                | MetricKind::StageSum { .. } => None,
            })
            .collect()
    }

    /// The compiled-in table mirroring the production dashboard: stage
    /// category counts, the two monetary cards, custom-flag counts, and
    /// the TMA status metrics.
    #[must_use]
    pub fn default_table() -> Self {
        fn stage_set(ids: &[&str]) -> BTreeSet<StageId> {
            ids.iter().map(|s| StageId::new(*s)).collect()
        }

        let metrics = vec![
            MetricDef::new("total", MetricKind::Total),
            MetricDef::new(
                "initial_stage",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:PREPAYMENT_INVOICE", "C9:NEW"]),
                },
            ),
            MetricDef::new(
                "waiting_for_realtor",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:PREPARATION"]),
                },
            ),
            MetricDef::new(
                "cold_clients",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:UC_W2GD5L"]),
                },
            ),
            MetricDef::new(
                "hot_clients",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:EXECUTING"]),
                },
            ),
            MetricDef::new(
                "pending_sales",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:UC_Q6HF3S"]),
                },
            ),
            MetricDef::new(
                "property_rental",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:UC_K66TBQ"]),
                },
            ),
            MetricDef::new(
                "listing_clients",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:UC_7Z843O"]),
                },
            ),
            MetricDef::new(
                "commercial_business",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:UC_E2VS4U"]),
                },
            ),
            MetricDef::new(
                "nutrition",
                MetricKind::StageCount {
                    stages: stage_set(&["C9:UC_9NSLPJ"]),
                },
            ),
            MetricDef::new(
                "closed_total",
                MetricKind::StageSum {
                    stages: stage_set(&["C9:WON"]),
                },
            ),
            MetricDef::new(
                "pending_total",
                MetricKind::StageSum {
                    stages: stage_set(&["C9:UC_W2GD5L", "C9:EXECUTING", "C9:UC_7Z843O"]),
                },
            ),
            MetricDef::new(
                "sdr_screening",
                MetricKind::FlagCount {
                    field: "UF_CRM_PREPAYMENT_INVOICE".to_string(),
                },
            ),
            MetricDef::new(
                "listing_clients_flag",
                MetricKind::FlagCount {
                    field: "UF_CRM_7Z8430".to_string(),
                },
            ),
            MetricDef::new(
                "property_rental_flag",
                MetricKind::FlagCount {
                    field: "UF_CRM_K66TBQ".to_string(),
                },
            ),
            MetricDef::new(
                "nutrition_flag",
                MetricKind::FlagCount {
                    field: "UF_CRM_9NSLPJ".to_string(),
                },
            ),
            MetricDef::new(
                "tma_urgent_late",
                MetricKind::FieldEquals {
                    field: "UF_CRM_1741896394870".to_string(),
                    value: "1635".to_string(),
                },
            ),
            MetricDef::new(
                "tma_update",
                MetricKind::FieldEquals {
                    field: "UF_CRM_1741896394870".to_string(),
                    value: "2203".to_string(),
                },
            ),
            MetricDef::new(
                "tma_started",
                MetricKind::FieldPresent {
                    field: "UF_CRM_START_TMA".to_string(),
                },
            ),
        ];

        Self { metrics }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let table = MetricSet::default_table();
        assert!(table.validate().is_ok());
        assert!(!table.is_empty());
    }

    #[test]
    fn rejects_duplicate_labels() {
        let result = MetricSet::new(vec![
            MetricDef::new("total", MetricKind::Total),
            MetricDef::new("total", MetricKind::Total),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_label() {
        let result = MetricSet::new(vec![MetricDef::new("", MetricKind::Total)]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_stage_group() {
        let result = MetricSet::new(vec![MetricDef::new(
            "empty",
            MetricKind::StageCount {
                stages: BTreeSet::new(),
            },
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_field_name() {
        let result = MetricSet::new(vec![MetricDef::new(
            "flag",
            MetricKind::FlagCount {
                field: String::new(),
            },
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn referenced_fields_covers_flag_and_field_metrics() {
        let table = MetricSet::default_table();
        let fields = table.referenced_fields();
        assert!(fields.contains("UF_CRM_PREPAYMENT_INVOICE"));
        assert!(fields.contains("UF_CRM_1741896394870"));
        assert!(fields.contains("UF_CRM_START_TMA"));
    }

    #[test]
    fn parses_from_toml() {
        let toml_src = r#"
            [[metric]]
            label = "closed_total"
            kind = "stage_sum"
            stages = ["C9:WON"]

            [[metric]]
            label = "urgent_late"
            kind = "field_equals"
            field = "UF_CRM_1741896394870"
            value = "1635"
        "#;

        let table: MetricSet = toml::from_str(toml_src).expect("parse");
        assert!(table.validate().is_ok());
        assert_eq!(table.len(), 2);

        let first = table.iter().next().expect("first metric");
        assert_eq!(first.label, "closed_total");
        assert!(matches!(first.kind, MetricKind::StageSum { .. }));
    }

    #[test]
    fn serde_json_roundtrip() {
        let table = MetricSet::default_table();
        let json = serde_json::to_string(&table).expect("serialize");
        let back: MetricSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(table, back);
    }
}
