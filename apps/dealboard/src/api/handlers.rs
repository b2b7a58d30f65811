//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        BreakdownEntry, BreakdownResponse, ErrorResponse, HealthResponse, MetricsQuery,
        MetricsResponse, RefreshRequest, RefreshResponse, SnapshotResponse, StatusResponse,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
};
use dealboard_core::{PipelineId, UserId};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get dashboard status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;

    let response = StatusResponse {
        pipeline: dashboard.pipeline().as_str().to_string(),
        generation: dashboard.generation(),
        pipeline_count: dashboard.pipelines().len(),
        user_count: dashboard.users().len(),
        stage_count: dashboard.stages().len(),
        deal_count: dashboard.deals().len(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// SNAPSHOT HANDLER
// =============================================================================

/// Get the lists the frontend renders: pipelines, users, stages.
pub async fn snapshot_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;

    let response = SnapshotResponse {
        pipelines: dashboard.pipelines().iter().map(Into::into).collect(),
        users: dashboard.users().iter().map(Into::into).collect(),
        stages: dashboard.stages().iter().map(Into::into).collect(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// METRICS HANDLER
// =============================================================================

/// Compute metrics over the current snapshot.
///
/// `?user_id=` restricts the computation to deals assigned to that user.
/// An empty `user_id` is treated the same as an absent one.
pub async fn metrics_handler(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let user = query
        .user_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(UserId::new);

    let dashboard = state.dashboard.read().await;
    let metrics = dashboard.metrics_for(&state.metrics, user.as_ref());

    let response = MetricsResponse {
        success: true,
        pipeline: dashboard.pipeline().as_str().to_string(),
        user_id: user.map(|u| u.as_str().to_string()),
        metrics,
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// BREAKDOWN HANDLER
// =============================================================================

/// Deal counts per assignee.
///
/// Entries are sorted by user id; users absent from the snapshot's user
/// list fall back to their raw id as the display name.
pub async fn breakdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.dashboard.read().await;
    let counts = dashboard.breakdown();

    let entries = counts
        .into_iter()
        .map(|(user_id, count)| {
            let full_name = dashboard
                .users()
                .iter()
                .find(|u| u.id == user_id)
                .map(|u| u.full_name.clone())
                .unwrap_or_else(|| user_id.as_str().to_string());
            BreakdownEntry {
                user_id: user_id.as_str().to_string(),
                full_name,
                count,
            }
        })
        .collect();

    let response = BreakdownResponse {
        success: true,
        entries,
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// REFRESH HANDLER
// =============================================================================

/// Re-fetch the snapshot from the upstream CRM.
///
/// The write lock is held only to open and close the refresh; the network
/// fetch itself runs without any lock. If a newer refresh starts while this
/// one is fetching, the stale result is discarded and `applied` is false.
pub async fn refresh_handler(
    State(state): State<AppState>,
    request: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let requested = request.and_then(|Json(r)| r.pipeline_id).map(PipelineId::new);

    let ticket = {
        let mut dashboard = state.dashboard.write().await;
        let pipeline = requested.unwrap_or_else(|| dashboard.pipeline().clone());
        dashboard.begin_refresh(pipeline)
    };

    let batch = state
        .client
        .fetch_batch(ticket.pipeline(), &state.metrics)
        .await;

    let mut dashboard = state.dashboard.write().await;
    let applied = dashboard.apply_refresh(ticket, batch);
    if !applied {
        tracing::info!("Refresh superseded by a newer one; result discarded");
    }

    let response = RefreshResponse {
        success: true,
        applied,
        generation: dashboard.generation(),
        deal_count: dashboard.deals().len(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// DEAL PROXY HANDLER
// =============================================================================

/// Forward a single-deal lookup to the upstream CRM.
///
/// Accepts POST with a JSON body of the form `{"id": 123}`. Any other
/// method gets 405, a missing or non-positive id gets 400, and an
/// upstream failure gets 500. On success the upstream JSON is passed
/// through unchanged.
pub async fn deal_proxy_handler(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> axum::response::Response {
    if method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorResponse::new("Method not allowed")),
        )
            .into_response();
    }

    let id = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("id").and_then(serde_json::Value::as_u64))
        .filter(|id| *id > 0);

    let Some(id) = id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Deal id is required")),
        )
            .into_response();
    };

    match state.client.get_deal(id).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            tracing::warn!("Deal lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("Upstream request failed: {}", e))),
            )
                .into_response()
        }
    }
}
