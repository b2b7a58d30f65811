//! # dealboard-core
//!
//! The deterministic aggregation engine for dealboard - THE LOGIC.
//!
//! This crate implements the CORE of the dashboard backend: given an
//! immutable list of CRM deals, an optional user filter, and a table of
//! named metric definitions, it produces a snapshot of counts and exact
//! decimal sums. Fetching and serving live in the application binary.
//!
//! ## Architectural Constraints
//!
//! - A metrics snapshot is a pure function of (deal list, user filter,
//!   metric table) - no hidden accumulation across computations
//! - Deterministic: `BTreeMap`/`BTreeSet` only, no floats, no randomness
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod dashboard;
pub mod flags;
pub mod groups;
pub mod money;
pub mod primitives;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Deal, DealId, DealboardError, Pipeline, PipelineId, StageId, StageMeta, User, UserId};

// =============================================================================
// RE-EXPORTS: Aggregation Engine
// =============================================================================

pub use aggregate::{MetricValue, MetricsSnapshot, aggregate, assignee_breakdown};
pub use dashboard::{Dashboard, FetchBatch, RefreshTicket};
pub use flags::{RawFlag, is_truthy};
pub use groups::{MetricDef, MetricKind, MetricSet};
pub use money::parse_amount;
