//! # Core Type Definitions
//!
//! This module contains all domain types for the dealboard aggregation core:
//! - String-backed identifiers (`DealId`, `PipelineId`, `UserId`, `StageId`)
//! - CRM records normalized at the ingestion boundary (`Deal`, `Pipeline`,
//!   `User`, `StageMeta`)
//! - Error types (`DealboardError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Carry no floating-point fields (monetary amounts stay as raw decimal
//!   strings until aggregation parses them exactly)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of a deal record in the CRM.
///
/// The CRM encodes every identifier as a string, even when numeric.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DealId(pub String);

/// Identifier of a pipeline (the CRM calls this a deal category).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PipelineId(pub String);

/// Identifier of a CRM user (deal assignee).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier of a pipeline stage, e.g. `"C9:WON"`.
///
/// The pipeline prefix (`C9:`) is part of the identifier; stage groups
/// match on the full string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub String);

macro_rules! string_id_impl {
    ($name:ident) => {
        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_impl!(DealId);
string_id_impl!(PipelineId);
string_id_impl!(UserId);
string_id_impl!(StageId);

// =============================================================================
// DEAL
// =============================================================================

/// A single CRM deal (opportunity), normalized at the ingestion boundary.
///
/// Immutable once fetched: a filter change that affects the pipeline
/// replaces the whole deal list rather than mutating records in place.
///
/// Custom `UF_*` fields arrive from the wire in heterogeneous encodings
/// (string `"Y"`/`"1"`, booleans, free text). Ingestion stores each field
/// twice: its normalized truthiness in `flags` and its raw text in
/// `fields`, so flag counts and literal value matches both work without
/// per-field schema knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// The deal identifier.
    pub id: DealId,
    /// Deal title (may be empty; not used by aggregation).
    pub title: String,
    /// The pipeline (category) this deal belongs to.
    pub pipeline: PipelineId,
    /// Current stage, absent for malformed records.
    pub stage: Option<StageId>,
    /// Assigned user, absent for unassigned deals.
    pub assigned_to: Option<UserId>,
    /// Opportunity amount as the raw decimal string from the wire.
    /// Parsed exactly at aggregation time; unparseable values count as zero.
    pub amount: Option<String>,
    /// Normalized boolean custom flags, keyed by CRM field name.
    pub flags: BTreeMap<String, bool>,
    /// Raw string custom fields, keyed by CRM field name.
    pub fields: BTreeMap<String, String>,
}

impl Deal {
    /// Create a minimal deal with no stage, assignee, amount, or custom fields.
    #[must_use]
    pub fn new(id: DealId, pipeline: PipelineId) -> Self {
        Self {
            id,
            title: String::new(),
            pipeline,
            stage: None,
            assigned_to: None,
            amount: None,
            flags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// A named workflow containing an ordered set of stages.
///
/// Fetched once per session load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// The pipeline identifier.
    pub id: PipelineId,
    /// Display name.
    pub name: String,
}

impl Pipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PipelineId::new(id),
            name: name.into(),
        }
    }
}

// =============================================================================
// USER
// =============================================================================

/// A CRM user with a derived full name.
///
/// The snapshot only carries users who appear as an assignee within the
/// currently loaded deal list; scoping happens in `Dashboard::apply_refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user identifier.
    pub id: UserId,
    /// Full name derived from first + last name.
    pub full_name: String,
}

impl User {
    /// Build a user from first and last name parts.
    ///
    /// Either part may be empty; the result is trimmed so a missing last
    /// name does not leave a trailing space.
    #[must_use]
    pub fn from_name_parts(id: UserId, first: &str, last: &str) -> Self {
        let full_name = format!("{} {}", first.trim(), last.trim())
            .trim()
            .to_string();
        Self { id, full_name }
    }
}

// =============================================================================
// STAGE METADATA
// =============================================================================

/// Metadata for a single kanban stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMeta {
    /// Full stage identifier, e.g. `"C9:PREPAYMENT_INVOICE"`.
    pub id: StageId,
    /// Bare status code, e.g. `"NEW"` or `"UC_L8M753"`.
    pub status_id: String,
    /// Display name.
    pub name: String,
    /// Numeric sort key; stage lists are ordered by this value.
    pub sort: u64,
    /// Kanban column color (`#000000` when the CRM omits it).
    pub color: String,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the dealboard system.
///
/// - No silent failures inside the core
/// - Use `Result<T, DealboardError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum DealboardError {
    /// A metric definition failed validation.
    #[error("Invalid metric definition: {0}")]
    InvalidMetric(String),

    /// A configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested pipeline is not present in the fetched pipeline list.
    #[error("Unknown pipeline: {0}")]
    UnknownPipeline(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
