//! # Dashboard Snapshot
//!
//! The single piece of state in the system: an immutable snapshot of the
//! fetched CRM data plus the pipeline selection that produced it.
//!
//! ## Single-Writer Transitions
//!
//! The source dashboard let overlapping fetch sequences race: a filter
//! change started a new fetch while the previous one was still in flight,
//! and whichever finished last overwrote shared state. Here every refresh
//! is bracketed by a generation ticket: `begin_refresh` bumps the
//! generation, and `apply_refresh` rejects any batch whose ticket is
//! stale. A superseded fetch is discarded instead of winning by timing.
//!
//! The struct itself is synchronous; the application wraps it in a lock
//! and holds that lock only for the begin/apply transitions, never across
//! the fetch.

use crate::aggregate::{self, MetricsSnapshot};
use crate::groups::MetricSet;
use crate::types::{Deal, Pipeline, PipelineId, StageMeta, User, UserId};
use std::collections::BTreeSet;

// =============================================================================
// FETCH BATCH
// =============================================================================

/// The result of one complete fetch sequence against the CRM.
///
/// Any listing call that failed upstream contributes an empty list;
/// "no data" and "fetch error" are indistinguishable by design.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchBatch {
    /// All pipelines known to the CRM.
    pub pipelines: Vec<Pipeline>,
    /// All users known to the CRM (scoped to assignees on apply).
    pub users: Vec<User>,
    /// Stage metadata, ordered by sort key.
    pub stages: Vec<StageMeta>,
    /// Deals belonging to the selected pipeline.
    pub deals: Vec<Deal>,
}

// =============================================================================
// REFRESH TICKET
// =============================================================================

/// Proof that a refresh was started against a specific generation.
///
/// Deliberately not `Clone`: one ticket, one apply.
#[derive(Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
    pipeline: PipelineId,
}

impl RefreshTicket {
    /// The pipeline this refresh is fetching.
    #[must_use]
    pub fn pipeline(&self) -> &PipelineId {
        &self.pipeline
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// The dashboard state: fetched lists plus the current pipeline selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pipelines: Vec<Pipeline>,
    users: Vec<User>,
    stages: Vec<StageMeta>,
    deals: Vec<Deal>,
    pipeline: PipelineId,
    generation: u64,
}

impl Dashboard {
    /// Create an empty dashboard targeting the given pipeline.
    #[must_use]
    pub fn new(pipeline: PipelineId) -> Self {
        Self {
            pipelines: Vec::new(),
            users: Vec::new(),
            stages: Vec::new(),
            deals: Vec::new(),
            pipeline,
            generation: 0,
        }
    }

    /// Start a refresh for `pipeline`.
    ///
    /// Bumps the generation, which invalidates any ticket issued earlier:
    /// a fetch still in flight for the previous selection will be
    /// discarded when it tries to apply.
    pub fn begin_refresh(&mut self, pipeline: PipelineId) -> RefreshTicket {
        self.generation = self.generation.saturating_add(1);
        self.pipeline = pipeline.clone();
        RefreshTicket {
            generation: self.generation,
            pipeline,
        }
    }

    /// Apply a completed fetch.
    ///
    /// Returns `false` without touching state when the ticket is stale
    /// (a newer refresh began while this fetch was in flight).
    ///
    /// On apply, the pipeline list is restricted to the selected pipeline
    /// (matching what the dashboard renders) and users are scoped to the
    /// assignees that actually appear in the applied deal list.
    pub fn apply_refresh(&mut self, ticket: RefreshTicket, batch: FetchBatch) -> bool {
        if ticket.generation != self.generation {
            return false;
        }

        let assignees: BTreeSet<&UserId> = batch
            .deals
            .iter()
            .filter_map(|d| d.assigned_to.as_ref())
            .collect();

        self.users = batch
            .users
            .into_iter()
            .filter(|u| assignees.contains(&u.id))
            .collect();
        self.pipelines = batch
            .pipelines
            .into_iter()
            .filter(|p| p.id == ticket.pipeline)
            .collect();
        self.stages = batch.stages;
        self.deals = batch.deals;
        true
    }

    /// Compute a metrics snapshot over the current deal list.
    ///
    /// The user filter is request-scoped: aggregation is a pure function
    /// of (deal list, filter), so there is nothing to store.
    #[must_use]
    pub fn metrics_for(&self, metrics: &MetricSet, user: Option<&UserId>) -> MetricsSnapshot {
        aggregate::aggregate(&self.deals, user, metrics)
    }

    /// Per-assignee deal counts over the current deal list.
    #[must_use]
    pub fn breakdown(&self) -> std::collections::BTreeMap<UserId, u64> {
        aggregate::assignee_breakdown(&self.deals)
    }

    /// The currently selected pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &PipelineId {
        &self.pipeline
    }

    /// Pipelines in the snapshot (the selected one, when known upstream).
    #[must_use]
    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    /// Users scoped to assignees in the current deal list.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Stage metadata, ordered by sort key.
    #[must_use]
    pub fn stages(&self) -> &[StageMeta] {
        &self.stages
    }

    /// The current deal list.
    #[must_use]
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    /// Refresh generation; bumps on every `begin_refresh`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// =============================================================================
// TESTS
// =============================================================================
