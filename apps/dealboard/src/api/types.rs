//! # API Request/Response Types
//!
//! This module defines the JSON structures for the dashboard HTTP API.

use dealboard_core::{MetricsSnapshot, Pipeline, StageMeta, User};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Snapshot status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub pipeline: String,
    pub generation: u64,
    pub pipeline_count: usize,
    pub user_count: usize,
    pub stage_count: usize,
    pub deal_count: usize,
}

// =============================================================================
// SNAPSHOT RESPONSE
// =============================================================================

/// Pipeline JSON representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineJson {
    pub id: String,
    pub name: String,
}

impl From<&Pipeline> for PipelineJson {
    fn from(p: &Pipeline) -> Self {
        Self {
            id: p.id.as_str().to_string(),
            name: p.name.clone(),
        }
    }
}

/// User JSON representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJson {
    pub id: String,
    pub full_name: String,
}

impl From<&User> for UserJson {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.as_str().to_string(),
            full_name: u.full_name.clone(),
        }
    }
}

/// Stage JSON representation, ordered by sort key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageJson {
    pub id: String,
    pub status_id: String,
    pub name: String,
    pub sort: u64,
    pub color: String,
}

impl From<&StageMeta> for StageJson {
    fn from(s: &StageMeta) -> Self {
        Self {
            id: s.id.as_str().to_string(),
            status_id: s.status_id.clone(),
            name: s.name.clone(),
            sort: s.sort,
            color: s.color.clone(),
        }
    }
}

/// Lists the frontend needs to render filters and kanban columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub pipelines: Vec<PipelineJson>,
    pub users: Vec<UserJson>,
    pub stages: Vec<StageJson>,
}

// =============================================================================
// METRICS REQUEST/RESPONSE
// =============================================================================

/// Query parameters for the metrics endpoint.
///
/// An absent or empty `user_id` means no user filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Computed metrics response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub success: bool,
    pub pipeline: String,
    pub user_id: Option<String>,
    pub metrics: MetricsSnapshot,
}

// =============================================================================
// BREAKDOWN RESPONSE
// =============================================================================

/// Deal count for a single assignee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub user_id: String,
    pub full_name: String,
    pub count: u64,
}

/// Per-assignee breakdown response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownResponse {
    pub success: bool,
    pub entries: Vec<BreakdownEntry>,
}

// =============================================================================
// REFRESH REQUEST/RESPONSE
// =============================================================================

/// Refresh request; omitting `pipeline_id` re-fetches the current selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub pipeline_id: Option<String>,
}

/// Refresh response.
///
/// `applied` is false when a newer refresh superseded this one while its
/// fetch was in flight; the fetched data was discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub applied: bool,
    pub generation: u64,
    pub deal_count: usize,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Structured JSON error body, used by the proxy endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
