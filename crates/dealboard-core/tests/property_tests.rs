//! # Property-Based Tests
//!
//! Verification of the aggregator's determinism and filter invariants.

use dealboard_core::{
    Deal, DealId, MetricDef, MetricKind, MetricSet, MetricValue, PipelineId, StageId, UserId,
    aggregate, assignee_breakdown,
};
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

// =============================================================================
// GENERATORS
// =============================================================================

/// Stage pool kept deliberately small so generated groups overlap deals.
const STAGE_POOL: &[&str] = &["C9:NEW", "C9:PREPARATION", "C9:EXECUTING", "C9:WON"];

fn arb_deal() -> impl Strategy<Value = Deal> {
    (
        0u64..10000,
        0usize..STAGE_POOL.len(),
        option::of(0u64..20),
        option::of("[0-9]{1,6}(\\.[0-9]{1,2})?"),
    )
        .prop_map(|(id, stage_idx, user, amount)| {
            let mut deal = Deal::new(DealId::new(id.to_string()), PipelineId::new("9"));
            deal.stage = Some(StageId::new(STAGE_POOL[stage_idx]));
            deal.assigned_to = user.map(|u| UserId::new(u.to_string()));
            deal.amount = amount;
            deal
        })
}

fn arb_stage_group() -> impl Strategy<Value = BTreeSet<StageId>> {
    proptest::sample::subsequence(STAGE_POOL.to_vec(), 1..=STAGE_POOL.len())
        .prop_map(|ids| ids.into_iter().map(StageId::new).collect())
}

fn table_for(stages: BTreeSet<StageId>) -> MetricSet {
    MetricSet::new(vec![
        MetricDef::new("total", MetricKind::Total),
        MetricDef::new("group", MetricKind::StageCount { stages: stages.clone() }),
        MetricDef::new("group_total", MetricKind::StageSum { stages }),
    ])
    .expect("valid table")
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Identical inputs produce bit-identical snapshots.
    #[test]
    fn aggregation_is_deterministic(
        deals in vec(arb_deal(), 0..50),
        stages in arb_stage_group(),
        user in option::of(0u64..20),
    ) {
        let table = table_for(stages);
        let user = user.map(|u| UserId::new(u.to_string()));

        let first = aggregate(&deals, user.as_ref(), &table);
        let second = aggregate(&deals, user.as_ref(), &table);

        prop_assert_eq!(first, second);
    }

    /// A group count equals a direct recount of filtered deals whose
    /// stage id is in the group's set.
    #[test]
    fn group_count_matches_direct_recount(
        deals in vec(arb_deal(), 0..50),
        stages in arb_stage_group(),
        user in option::of(0u64..20),
    ) {
        let table = table_for(stages.clone());
        let user = user.map(|u| UserId::new(u.to_string()));
        let snapshot = aggregate(&deals, user.as_ref(), &table);

        let expected = deals
            .iter()
            .filter(|d| user.as_ref().is_none_or(|u| d.assigned_to.as_ref() == Some(u)))
            .filter(|d| d.stage.as_ref().is_some_and(|s| stages.contains(s)))
            .count() as u64;

        prop_assert_eq!(snapshot["group"].as_count(), Some(expected));
    }

    /// An empty user filter yields the unfiltered totals.
    #[test]
    fn empty_filter_equals_unfiltered(
        deals in vec(arb_deal(), 0..50),
        stages in arb_stage_group(),
    ) {
        let table = table_for(stages);
        let unfiltered = aggregate(&deals, None, &table);

        let total = deals.len() as u64;
        prop_assert_eq!(unfiltered["total"].as_count(), Some(total));
    }

    /// A group count never exceeds the filtered total.
    #[test]
    fn group_count_bounded_by_total(
        deals in vec(arb_deal(), 0..50),
        stages in arb_stage_group(),
        user in option::of(0u64..20),
    ) {
        let table = table_for(stages);
        let user = user.map(|u| UserId::new(u.to_string()));
        let snapshot = aggregate(&deals, user.as_ref(), &table);

        let total = snapshot["total"].as_count().expect("count");
        let group = snapshot["group"].as_count().expect("count");
        prop_assert!(group <= total);
    }

    /// All-invalid amounts always sum to exactly zero.
    #[test]
    fn invalid_amounts_sum_to_zero(
        deals in vec(arb_deal(), 0..50),
        stages in arb_stage_group(),
    ) {
        let table = table_for(stages);

        let broken: Vec<Deal> = deals
            .into_iter()
            .map(|mut d| {
                d.amount = Some("not-a-number".to_string());
                d
            })
            .collect();

        let snapshot = aggregate(&broken, None, &table);
        prop_assert_eq!(&snapshot["group_total"], &MetricValue::Sum(Decimal::ZERO));
    }

    /// Breakdown counts sum to the number of assigned deals.
    #[test]
    fn breakdown_totals_match_assigned_deals(deals in vec(arb_deal(), 0..50)) {
        let counts = assignee_breakdown(&deals);

        let assigned = deals.iter().filter(|d| d.assigned_to.is_some()).count() as u64;
        let summed: u64 = counts.values().sum();
        prop_assert_eq!(summed, assigned);
    }
}
