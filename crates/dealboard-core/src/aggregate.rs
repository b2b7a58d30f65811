//! # Aggregator
//!
//! The stateless core computation: filter a deal list by assignee, then
//! evaluate every metric in a table against the filtered list.
//!
//! ## Determinism
//!
//! Given the same inputs the output is bit-identical. The snapshot is a
//! `BTreeMap`, counts are integers, and sums are exact decimals; there is
//! no ordering dependency and no accumulation across calls.

use crate::groups::{MetricKind, MetricSet};
use crate::money::parse_amount;
use crate::types::{Deal, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// METRIC VALUE
// =============================================================================

/// The computed value of a single metric.
///
/// Serialized untagged: counts appear as JSON integers, sums as decimal
/// strings (exact, no float representation on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// An integer count of matching deals.
    Count(u64),
    /// An exact decimal sum of opportunity amounts.
    Sum(Decimal),
}

impl MetricValue {
    /// The count, if this is a count metric.
    #[must_use]
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            Self::Sum(_) => None,
        }
    }

    /// The sum, if this is a monetary metric.
    #[must_use]
    pub fn as_sum(&self) -> Option<Decimal> {
        match self {
            Self::Count(_) => None,
            Self::Sum(d) => Some(*d),
        }
    }
}

/// A computed snapshot: metric label to value.
///
/// Transient, recomputed whenever the deal list or filter selection
/// changes; never carried across renders.
pub type MetricsSnapshot = BTreeMap<String, MetricValue>;

// =============================================================================
// AGGREGATION
// =============================================================================

/// Compute a metrics snapshot over a deal list.
///
/// Deals are first restricted to those assigned to `user` (all deals when
/// `user` is `None`), then every metric in `metrics` is evaluated against
/// the restricted list.
#[must_use]
pub fn aggregate(deals: &[Deal], user: Option<&UserId>, metrics: &MetricSet) -> MetricsSnapshot {
    let filtered: Vec<&Deal> = deals
        .iter()
        .filter(|d| matches_user(d, user))
        .collect();

    let mut snapshot = MetricsSnapshot::new();
    for def in metrics.iter() {
        let value = match &def.kind {
            MetricKind::Total => MetricValue::Count(filtered.len() as u64),
            MetricKind::StageCount { stages } => MetricValue::Count(
                filtered
                    .iter()
                    .filter(|d| d.stage.as_ref().is_some_and(|s| stages.contains(s)))
                    .count() as u64,
            ),
            MetricKind::StageSum { stages } => MetricValue::Sum(
                filtered
                    .iter()
                    .filter(|d| d.stage.as_ref().is_some_and(|s| stages.contains(s)))
                    .map(|d| parse_amount(d.amount.as_deref()))
                    .sum::<Decimal>(),
            ),
            MetricKind::FlagCount { field } => MetricValue::Count(
                filtered
                    .iter()
                    .filter(|d| d.flags.get(field).copied().unwrap_or(false))
                    .count() as u64,
            ),
            MetricKind::FieldEquals { field, value } => MetricValue::Count(
                filtered
                    .iter()
                    .filter(|d| d.fields.get(field).is_some_and(|v| v == value))
                    .count() as u64,
            ),
            MetricKind::FieldPresent { field } => MetricValue::Count(
                filtered
                    .iter()
                    .filter(|d| d.fields.get(field).is_some_and(|v| !v.is_empty()))
                    .count() as u64,
            ),
        };
        snapshot.insert(def.label.clone(), value);
    }

    snapshot
}

/// Per-assignee deal counts over the full (unfiltered) deal list.
///
/// Unassigned deals are not represented; the breakdown covers exactly the
/// users who appear as an assignee.
#[must_use]
pub fn assignee_breakdown(deals: &[Deal]) -> BTreeMap<UserId, u64> {
    let mut counts: BTreeMap<UserId, u64> = BTreeMap::new();
    for deal in deals {
        if let Some(user) = &deal.assigned_to {
            let entry = counts.entry(user.clone()).or_insert(0);
            *entry = entry.saturating_add(1);
        }
    }
    counts
}

fn matches_user(deal: &Deal, user: Option<&UserId>) -> bool {
    match user {
        None => true,
        Some(u) => deal.assigned_to.as_ref() == Some(u),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::MetricDef;
    use crate::types::{DealId, PipelineId, StageId};
    use std::collections::BTreeSet;
    use std::str::FromStr;

    fn deal(id: &str, stage: &str, amount: &str) -> Deal {
        let mut d = Deal::new(DealId::new(id), PipelineId::new("9"));
        d.stage = Some(StageId::new(stage));
        if !amount.is_empty() {
            d.amount = Some(amount.to_string());
        }
        d
    }

    fn closed_group() -> MetricSet {
        let stages: BTreeSet<StageId> = [StageId::new("C9:WON")].into_iter().collect();
        MetricSet::new(vec![
            MetricDef::new("closed", MetricKind::StageCount { stages: stages.clone() }),
            MetricDef::new("closed_total", MetricKind::StageSum { stages }),
        ])
        .expect("valid table")
    }

    #[test]
    fn closed_group_scenario() {
        // NEW/100 and WON/50 against closed = [C9:WON]: one match, sum 50.
        let deals = vec![deal("1", "C9:NEW", "100"), deal("2", "C9:WON", "50")];
        let snapshot = aggregate(&deals, None, &closed_group());

        assert_eq!(snapshot["closed"], MetricValue::Count(1));
        assert_eq!(
            snapshot["closed_total"],
            MetricValue::Sum(Decimal::from_str("50").expect("decimal"))
        );
    }

    #[test]
    fn user_filter_restricts_counts() {
        let mut a = deal("1", "C9:WON", "10");
        a.assigned_to = Some(UserId::new("7"));
        let mut b = deal("2", "C9:WON", "20");
        b.assigned_to = Some(UserId::new("8"));
        let deals = vec![a, b];

        let filtered = aggregate(&deals, Some(&UserId::new("7")), &closed_group());
        assert_eq!(filtered["closed"], MetricValue::Count(1));

        let unfiltered = aggregate(&deals, None, &closed_group());
        assert_eq!(unfiltered["closed"], MetricValue::Count(2));
    }

    #[test]
    fn invalid_amounts_sum_to_zero() {
        let deals = vec![
            deal("1", "C9:WON", ""),
            deal("2", "C9:WON", "not-a-number"),
        ];
        let snapshot = aggregate(&deals, None, &closed_group());
        assert_eq!(snapshot["closed_total"], MetricValue::Sum(Decimal::ZERO));
    }

    #[test]
    fn flag_count_uses_normalized_flags() {
        let mut flagged = deal("1", "C9:NEW", "");
        flagged.flags.insert("UF_CRM_K66TBQ".to_string(), true);
        let unflagged = deal("2", "C9:NEW", "");

        let table = MetricSet::new(vec![MetricDef::new(
            "rental",
            MetricKind::FlagCount {
                field: "UF_CRM_K66TBQ".to_string(),
            },
        )])
        .expect("valid table");

        let snapshot = aggregate(&[flagged, unflagged], None, &table);
        assert_eq!(snapshot["rental"], MetricValue::Count(1));
    }

    #[test]
    fn field_equals_matches_literal_value() {
        let mut late = deal("1", "C9:NEW", "");
        late.fields
            .insert("UF_CRM_1741896394870".to_string(), "1635".to_string());
        let mut updated = deal("2", "C9:NEW", "");
        updated
            .fields
            .insert("UF_CRM_1741896394870".to_string(), "2203".to_string());

        let table = MetricSet::new(vec![MetricDef::new(
            "urgent_late",
            MetricKind::FieldEquals {
                field: "UF_CRM_1741896394870".to_string(),
                value: "1635".to_string(),
            },
        )])
        .expect("valid table");

        let snapshot = aggregate(&[late, updated], None, &table);
        assert_eq!(snapshot["urgent_late"], MetricValue::Count(1));
    }

    #[test]
    fn field_present_ignores_empty_values() {
        let mut started = deal("1", "C9:NEW", "");
        started
            .fields
            .insert("UF_CRM_START_TMA".to_string(), "2025-01-01".to_string());
        let mut blank = deal("2", "C9:NEW", "");
        blank
            .fields
            .insert("UF_CRM_START_TMA".to_string(), String::new());

        let table = MetricSet::new(vec![MetricDef::new(
            "tma_started",
            MetricKind::FieldPresent {
                field: "UF_CRM_START_TMA".to_string(),
            },
        )])
        .expect("valid table");

        let snapshot = aggregate(&[started, blank], None, &table);
        assert_eq!(snapshot["tma_started"], MetricValue::Count(1));
    }

    #[test]
    fn breakdown_counts_per_assignee() {
        let mut a = deal("1", "C9:NEW", "");
        a.assigned_to = Some(UserId::new("7"));
        let mut b = deal("2", "C9:NEW", "");
        b.assigned_to = Some(UserId::new("7"));
        let unassigned = deal("3", "C9:NEW", "");

        let counts = assignee_breakdown(&[a, b, unassigned]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&UserId::new("7")], 2);
    }

    #[test]
    fn metric_value_serializes_counts_as_integers() {
        let json = serde_json::to_string(&MetricValue::Count(3)).expect("serialize");
        assert_eq!(json, "3");
    }

    #[test]
    fn metric_value_serializes_sums_as_decimal_strings() {
        let sum = MetricValue::Sum(Decimal::from_str("1500.50").expect("decimal"));
        let json = serde_json::to_string(&sum).expect("serialize");
        assert_eq!(json, "\"1500.50\"");
    }
}
