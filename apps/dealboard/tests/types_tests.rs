//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use dealboard::api::{
    BreakdownEntry, ErrorResponse, HealthResponse, MetricsResponse, PipelineJson, RefreshRequest,
    RefreshResponse, StageJson, StatusResponse, UserJson,
};
use dealboard_core::{MetricValue, Pipeline, StageId, StageMeta, User, UserId};
use rust_decimal::Decimal;
use std::str::FromStr;

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// STATUS RESPONSE TESTS
// =============================================================================

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        pipeline: "9".to_string(),
        generation: 3,
        pipeline_count: 2,
        user_count: 14,
        stage_count: 10,
        deal_count: 250,
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"pipeline\":\"9\""));
    assert!(json.contains("\"generation\":3"));
    assert!(json.contains("\"deal_count\":250"));
}

#[test]
fn test_status_response_deserialization() {
    let json = r#"{"pipeline":"9","generation":1,"pipeline_count":1,"user_count":2,"stage_count":10,"deal_count":42}"#;
    let status: StatusResponse = serde_json::from_str(json).unwrap();

    assert_eq!(status.pipeline, "9");
    assert_eq!(status.generation, 1);
    assert_eq!(status.deal_count, 42);
}

// =============================================================================
// SNAPSHOT JSON TESTS
// =============================================================================

#[test]
fn test_pipeline_json_from_core() {
    let pipeline = Pipeline::new("9", "Sales");
    let json = PipelineJson::from(&pipeline);

    assert_eq!(json.id, "9");
    assert_eq!(json.name, "Sales");
}

#[test]
fn test_user_json_from_core() {
    let user = User::from_name_parts(UserId::new("7"), "Dana", "Reeve");
    let json = UserJson::from(&user);

    assert_eq!(json.id, "7");
    assert_eq!(json.full_name, "Dana Reeve");
}

#[test]
fn test_stage_json_from_core() {
    let stage = StageMeta {
        id: StageId::new("C9:NEW"),
        status_id: "NEW".to_string(),
        name: "Incoming".to_string(),
        sort: 10,
        color: "#39A8EF".to_string(),
    };
    let json = StageJson::from(&stage);

    assert_eq!(json.id, "C9:NEW");
    assert_eq!(json.sort, 10);
    assert_eq!(json.color, "#39A8EF");
}

// =============================================================================
// METRICS RESPONSE TESTS
// =============================================================================

#[test]
fn test_metrics_response_serialization() {
    let mut metrics = dealboard_core::MetricsSnapshot::new();
    metrics.insert("total".to_string(), MetricValue::Count(3));
    metrics.insert(
        "closed_total".to_string(),
        MetricValue::Sum(Decimal::from_str("1500.50").unwrap()),
    );

    let response = MetricsResponse {
        success: true,
        pipeline: "9".to_string(),
        user_id: None,
        metrics,
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"total\":3"));
    assert!(json.contains("\"closed_total\":\"1500.50\""));
    assert!(json.contains("\"user_id\":null"));
}

#[test]
fn test_metrics_response_deserialization() {
    let json = r#"{"success":true,"pipeline":"9","user_id":"7","metrics":{"total":5,"closed_total":"99.90"}}"#;
    let response: MetricsResponse = serde_json::from_str(json).unwrap();

    assert_eq!(response.user_id.as_deref(), Some("7"));
    assert_eq!(response.metrics.get("total"), Some(&MetricValue::Count(5)));
    assert_eq!(
        response.metrics.get("closed_total"),
        Some(&MetricValue::Sum(Decimal::from_str("99.90").unwrap()))
    );
}

// =============================================================================
// BREAKDOWN TESTS
// =============================================================================

#[test]
fn test_breakdown_entry_serialization() {
    let entry = BreakdownEntry {
        user_id: "7".to_string(),
        full_name: "Dana Reeve".to_string(),
        count: 12,
    };

    let json = serde_json::to_string(&entry).unwrap();
    assert!(json.contains("\"user_id\":\"7\""));
    assert!(json.contains("\"full_name\":\"Dana Reeve\""));
    assert!(json.contains("\"count\":12"));
}

// =============================================================================
// REFRESH TESTS
// =============================================================================

#[test]
fn test_refresh_request_empty_body_means_current_pipeline() {
    let request: RefreshRequest = serde_json::from_str("{}").unwrap();
    assert!(request.pipeline_id.is_none());
}

#[test]
fn test_refresh_request_with_pipeline() {
    let request: RefreshRequest = serde_json::from_str(r#"{"pipeline_id":"12"}"#).unwrap();
    assert_eq!(request.pipeline_id.as_deref(), Some("12"));
}

#[test]
fn test_refresh_response_serialization() {
    let response = RefreshResponse {
        success: true,
        applied: false,
        generation: 7,
        deal_count: 0,
    };

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"applied\":false"));
    assert!(json.contains("\"generation\":7"));
}

// =============================================================================
// ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_error_response_serialization() {
    let error = ErrorResponse::new("Deal id is required");
    let json = serde_json::to_string(&error).unwrap();
    assert_eq!(json, r#"{"error":"Deal id is required"}"#);
}
