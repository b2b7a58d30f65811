//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::crm::CrmClient;
use dealboard_core::{
    Dashboard, DealboardError, MetricSet, PipelineId, UserId, primitives::DEFAULT_PIPELINE_ID,
};
use std::path::Path;

// =============================================================================
// METRIC CONFIGURATION
// =============================================================================

/// Maximum size for a metric configuration file (1 MB).
///
/// Metric tables are small; anything larger is a mistake.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Load the metric table from a TOML file, or fall back to the built-in one.
pub fn load_metric_set(path: Option<&Path>) -> Result<MetricSet, DealboardError> {
    let Some(path) = path else {
        return Ok(MetricSet::default_table());
    };

    let metadata = std::fs::metadata(path)
        .map_err(|e| DealboardError::IoError(format!("Cannot read file metadata: {}", e)))?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(DealboardError::Config(format!(
            "Config file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| DealboardError::IoError(format!("Cannot read config file: {}", e)))?;
    let set: MetricSet = toml::from_str(&text)
        .map_err(|e| DealboardError::Config(format!("Invalid metric config: {}", e)))?;
    set.validate()?;
    Ok(set)
}

/// Build an upstream client, mapping failures to configuration errors.
fn build_client(base_url: &str) -> Result<CrmClient, DealboardError> {
    CrmClient::new(base_url)
        .map_err(|e| DealboardError::Config(format!("Cannot build CRM client: {}", e)))
}

fn resolve_pipeline(pipeline: Option<String>) -> PipelineId {
    PipelineId::new(pipeline.unwrap_or_else(|| DEFAULT_PIPELINE_ID.to_string()))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    base_url: &str,
    host: &str,
    port: u16,
    pipeline: Option<String>,
    metrics: MetricSet,
) -> Result<(), DealboardError> {
    let client = build_client(base_url)?;
    let pipeline = resolve_pipeline(pipeline);

    // Fetch the initial snapshot before accepting requests.
    let mut dashboard = Dashboard::new(pipeline.clone());
    let ticket = dashboard.begin_refresh(pipeline.clone());
    let batch = client.fetch_batch(&pipeline, &metrics).await;
    dashboard.apply_refresh(ticket, batch);

    println!("Dealboard CRM Dashboard Backend Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Upstream: {}", client.base_url());
    println!("  Pipeline: {}", pipeline);
    println!("  Metrics:  {}", metrics.len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health    - Health check");
    println!("  GET  /status    - Snapshot status");
    println!("  GET  /snapshot  - Pipelines, users, stages");
    println!("  GET  /metrics   - Computed metrics (?user_id=)");
    println!("  GET  /breakdown - Deal counts per assignee");
    println!("  POST /refresh   - Re-fetch from the upstream CRM");
    println!("  POST /deal      - Proxy a single-deal lookup");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(dashboard, client, metrics);
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// PIPELINES COMMAND
// =============================================================================

/// List pipelines from the upstream CRM.
pub async fn cmd_pipelines(base_url: &str, json_mode: bool) -> Result<(), DealboardError> {
    let client = build_client(base_url)?;
    let pipelines = client.list_pipelines().await;

    if json_mode {
        let output = serde_json::json!({
            "count": pipelines.len(),
            "pipelines": pipelines
                .iter()
                .map(|p| serde_json::json!({"id": p.id.as_str(), "name": p.name}))
                .collect::<Vec<_>>()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Pipelines ({})", pipelines.len());
    println!("==============");
    for p in &pipelines {
        println!("{:>6}  {}", p.id, p.name);
    }

    Ok(())
}

// =============================================================================
// USERS COMMAND
// =============================================================================

/// List users from the upstream CRM.
pub async fn cmd_users(base_url: &str, json_mode: bool) -> Result<(), DealboardError> {
    let client = build_client(base_url)?;
    let users = client.list_users().await;

    if json_mode {
        let output = serde_json::json!({
            "count": users.len(),
            "users": users
                .iter()
                .map(|u| serde_json::json!({"id": u.id.as_str(), "full_name": u.full_name}))
                .collect::<Vec<_>>()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Users ({})", users.len());
    println!("==========");
    for u in &users {
        println!("{:>6}  {}", u.id, u.full_name);
    }

    Ok(())
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

/// List deal stages from the upstream CRM, ordered by sort key.
pub async fn cmd_stages(base_url: &str, json_mode: bool) -> Result<(), DealboardError> {
    let client = build_client(base_url)?;
    let stages = client.list_deal_stages().await;

    if json_mode {
        let output = serde_json::json!({
            "count": stages.len(),
            "stages": stages
                .iter()
                .map(|s| serde_json::json!({
                    "id": s.id.as_str(),
                    "name": s.name,
                    "sort": s.sort,
                    "color": s.color
                }))
                .collect::<Vec<_>>()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Deal Stages ({})", stages.len());
    println!("================");
    for s in &stages {
        println!("{:>6}  {:<28}  {}", s.sort, s.id, s.name);
    }

    Ok(())
}

// =============================================================================
// FETCH COMMAND
// =============================================================================

/// Fetch a full snapshot and print counts.
pub async fn cmd_fetch(
    base_url: &str,
    json_mode: bool,
    pipeline: Option<String>,
    metrics: &MetricSet,
) -> Result<(), DealboardError> {
    let client = build_client(base_url)?;
    let pipeline = resolve_pipeline(pipeline);

    let mut dashboard = Dashboard::new(pipeline.clone());
    let ticket = dashboard.begin_refresh(pipeline.clone());
    let batch = client.fetch_batch(&pipeline, metrics).await;
    dashboard.apply_refresh(ticket, batch);

    if json_mode {
        let output = serde_json::json!({
            "pipeline": pipeline.as_str(),
            "pipeline_count": dashboard.pipelines().len(),
            "user_count": dashboard.users().len(),
            "stage_count": dashboard.stages().len(),
            "deal_count": dashboard.deals().len()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Snapshot for pipeline {}", pipeline);
    println!("=========================");
    println!("Pipelines: {}", dashboard.pipelines().len());
    println!("Users:     {}", dashboard.users().len());
    println!("Stages:    {}", dashboard.stages().len());
    println!("Deals:     {}", dashboard.deals().len());

    Ok(())
}

// =============================================================================
// METRICS COMMAND
// =============================================================================

/// Fetch a snapshot and print computed metrics.
pub async fn cmd_metrics(
    base_url: &str,
    json_mode: bool,
    pipeline: Option<String>,
    user: Option<String>,
    metrics: &MetricSet,
) -> Result<(), DealboardError> {
    let client = build_client(base_url)?;
    let pipeline = resolve_pipeline(pipeline);
    let user = user.filter(|s| !s.is_empty()).map(UserId::new);

    let mut dashboard = Dashboard::new(pipeline.clone());
    let ticket = dashboard.begin_refresh(pipeline.clone());
    let batch = client.fetch_batch(&pipeline, metrics).await;
    dashboard.apply_refresh(ticket, batch);

    let snapshot = dashboard.metrics_for(metrics, user.as_ref());

    if json_mode {
        let output = serde_json::json!({
            "pipeline": pipeline.as_str(),
            "user_id": user.as_ref().map(|u| u.as_str()),
            "deal_count": dashboard.deals().len(),
            "metrics": snapshot
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Metrics for pipeline {}", pipeline);
    match &user {
        Some(u) => println!("Filtered to user {}", u),
        None => println!("All users"),
    }
    println!("========================");
    for (label, value) in &snapshot {
        match value.as_sum() {
            Some(sum) => println!("{:<24}  {}", label, sum),
            None => println!("{:<24}  {}", label, value.as_count().unwrap_or(0)),
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use std::io::Write;

    #[test]
    fn load_metric_set_defaults_without_path() {
        let set = load_metric_set(None).expect("default table");
        assert!(!set.is_empty());
    }

    #[test]
    fn load_metric_set_parses_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"
[[metric]]
label = "total"
kind = "total"

[[metric]]
label = "won"
kind = "stage_count"
stages = ["C9:WON"]
"#
        )
        .expect("write config");

        let set = load_metric_set(Some(file.path())).expect("parse config");
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn load_metric_set_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not toml at all [[[").expect("write config");

        let err = load_metric_set(Some(file.path())).unwrap_err();
        assert!(matches!(err, DealboardError::Config(_)));
    }

    #[test]
    fn load_metric_set_missing_file_is_io_error() {
        let err = load_metric_set(Some(Path::new("/nonexistent/metrics.toml"))).unwrap_err();
        assert!(matches!(err, DealboardError::IoError(_)));
    }
}
