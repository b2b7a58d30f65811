//! # CRM HTTP Client
//!
//! Wrapper around the CRM REST API. Listing calls follow the `next`
//! pagination cursor sequentially, waiting a fixed delay between pages —
//! the CRM rate-limits aggressive clients, so there is never more than
//! one request in flight.
//!
//! ## Failure Contract
//!
//! Every public listing call converts any transport, status, or parse
//! failure into an empty list after logging a warning. Callers must
//! treat "no data" and "fetch error" identically; only `get_deal` (used
//! by the proxy endpoint) surfaces its error, because the proxy has to
//! answer 500 on upstream failure.

use super::types::{PageResponse, RawDeal, RawPipeline, RawStage, RawUser};
use dealboard_core::{Deal, FetchBatch, MetricSet, Pipeline, PipelineId, StageMeta, User};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed delay between successive pages of one listing call.
const PAGE_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on pages followed for a single listing call.
///
/// A misbehaving upstream that keeps returning a `next` cursor would
/// otherwise loop forever; hitting this bound logs and returns what was
/// fetched so far.
const MAX_PAGE_FETCHES: usize = 1000;

/// REST method names, appended to the base URL.
const PIPELINES_METHOD: &str = "crm.dealcategory.list.json";
const USERS_METHOD: &str = "user.get.json";
const STAGES_METHOD: &str = "crm.status.list.json";
const DEALS_METHOD: &str = "crm.deal.list.json";
const DEAL_GET_METHOD: &str = "crm.deal.get.json";

/// Fields always requested for deal records; custom fields referenced by
/// the metric table are appended per request.
const DEAL_BASE_SELECT: &[&str] = &[
    "ID",
    "TITLE",
    "STAGE_ID",
    "CATEGORY_ID",
    "ASSIGNED_BY_ID",
    "OPPORTUNITY",
];

// =============================================================================
// CLIENT ERRORS
// =============================================================================

/// Errors from the CRM HTTP layer.
#[derive(Debug)]
pub enum CrmError {
    /// Cannot reach the CRM endpoint.
    ConnectionFailed(String),
    /// The CRM answered with a non-success status.
    ServerError(u16, String),
    /// Failed to parse the response body.
    ParseError(String),
}

impl std::fmt::Display for CrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to CRM at {url}"),
            Self::ServerError(status, msg) => write!(f, "CRM error ({status}): {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for CrmError {}

// =============================================================================
// CRM CLIENT
// =============================================================================

/// HTTP client that wraps calls to the CRM REST API.
#[derive(Debug, Clone)]
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
}

impl CrmClient {
    /// Create a new client pointing at the given CRM base URL
    /// (everything before the method name, without a trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self, CrmError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CrmError::ConnectionFailed(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Send a request and handle connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, CrmError> {
        req.send()
            .await
            .map_err(|e| CrmError::ConnectionFailed(format!("{}: {e}", self.base_url)))
    }

    /// Handle an HTTP response: check the status and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, CrmError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CrmError::ServerError(status.as_u16(), body));
        }
        resp.json::<T>()
            .await
            .map_err(|e| CrmError::ParseError(e.to_string()))
    }

    /// Follow the pagination cursor until it is exhausted.
    ///
    /// `page` builds the request for a given start offset. One page per
    /// request, a fixed delay between pages, no concurrency.
    async fn fetch_all_pages<T, F>(&self, mut page: F) -> Result<Vec<T>, CrmError>
    where
        T: DeserializeOwned,
        F: FnMut(u64) -> reqwest::RequestBuilder,
    {
        let mut records = Vec::new();
        let mut start = 0u64;
        let mut pages = 0usize;

        loop {
            let resp = self.send(page(start)).await?;
            let body: PageResponse<T> = self.handle_response(resp).await?;
            records.extend(body.result);
            pages = pages.saturating_add(1);

            match body.next {
                None => break,
                Some(next) if pages >= MAX_PAGE_FETCHES => {
                    tracing::warn!(
                        pages,
                        next,
                        "page limit reached before cursor was exhausted"
                    );
                    break;
                }
                Some(next) => {
                    tokio::time::sleep(PAGE_DELAY).await;
                    start = next;
                }
            }
        }

        Ok(records)
    }

    // =========================================================================
    // LISTING CALLS (failure => empty list)
    // =========================================================================

    /// List all pipelines (deal categories).
    pub async fn list_pipelines(&self) -> Vec<Pipeline> {
        match self.try_list_pipelines().await {
            Ok(pipelines) => pipelines,
            Err(e) => {
                tracing::warn!(error = %e, "pipeline listing failed, returning empty result");
                Vec::new()
            }
        }
    }

    async fn try_list_pipelines(&self) -> Result<Vec<Pipeline>, CrmError> {
        let req = self.http.get(self.url(PIPELINES_METHOD));
        let resp = self.send(req).await?;
        let body: PageResponse<RawPipeline> = self.handle_response(resp).await?;
        Ok(body
            .result
            .into_iter()
            .map(RawPipeline::into_pipeline)
            .collect())
    }

    /// List all users, following the pagination cursor.
    pub async fn list_users(&self) -> Vec<User> {
        match self.try_list_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "user listing failed, returning empty result");
                Vec::new()
            }
        }
    }

    async fn try_list_users(&self) -> Result<Vec<User>, CrmError> {
        let url = self.url(USERS_METHOD);
        let raw: Vec<RawUser> = self
            .fetch_all_pages(|start| self.http.get(&url).query(&[("start", start)]))
            .await?;
        Ok(raw.into_iter().map(RawUser::into_user).collect())
    }

    /// List deal stage metadata, ordered by the numeric sort key.
    pub async fn list_deal_stages(&self) -> Vec<StageMeta> {
        match self.try_list_deal_stages().await {
            Ok(stages) => stages,
            Err(e) => {
                tracing::warn!(error = %e, "stage listing failed, returning empty result");
                Vec::new()
            }
        }
    }

    async fn try_list_deal_stages(&self) -> Result<Vec<StageMeta>, CrmError> {
        let body = json!({ "filter": { "ENTITY_ID": "DEAL_STAGE" } });
        let req = self.http.post(self.url(STAGES_METHOD)).json(&body);
        let resp = self.send(req).await?;
        let page: PageResponse<RawStage> = self.handle_response(resp).await?;

        let mut stages: Vec<StageMeta> = page
            .result
            .into_iter()
            .map(RawStage::into_stage_meta)
            .collect();
        stages.sort_by_key(|s| s.sort);
        Ok(stages)
    }

    /// List deals in a pipeline, following the pagination cursor.
    ///
    /// The server-side `select` covers the base deal fields plus every
    /// custom field the metric table references.
    pub async fn list_deals(&self, pipeline: &PipelineId, metrics: &MetricSet) -> Vec<Deal> {
        match self.try_list_deals(pipeline, metrics).await {
            Ok(deals) => deals,
            Err(e) => {
                tracing::warn!(
                    pipeline = %pipeline,
                    error = %e,
                    "deal listing failed, returning empty result"
                );
                Vec::new()
            }
        }
    }

    async fn try_list_deals(
        &self,
        pipeline: &PipelineId,
        metrics: &MetricSet,
    ) -> Result<Vec<Deal>, CrmError> {
        let mut select: Vec<&str> = DEAL_BASE_SELECT.to_vec();
        select.extend(metrics.referenced_fields());

        let url = self.url(DEALS_METHOD);
        let raw: Vec<RawDeal> = self
            .fetch_all_pages(|start| {
                let body = json!({
                    "filter": { "CATEGORY_ID": pipeline.as_str() },
                    "select": select,
                    "start": start,
                });
                self.http.post(&url).json(&body)
            })
            .await?;
        Ok(raw.into_iter().map(RawDeal::into_deal).collect())
    }

    // =========================================================================
    // DEAL LOOKUP (used by the proxy endpoint)
    // =========================================================================

    /// Fetch a single deal by id, returning the upstream JSON unchanged.
    ///
    /// Unlike the listing calls this propagates errors: the proxy
    /// endpoint answers 500 on upstream failure.
    pub async fn get_deal(&self, id: u64) -> Result<Value, CrmError> {
        let req = self
            .http
            .get(self.url(DEAL_GET_METHOD))
            .query(&[("id", id)]);
        let resp = self.send(req).await?;
        self.handle_response(resp).await
    }

    // =========================================================================
    // FETCH SEQUENCE
    // =========================================================================

    /// Run the full load sequence for a pipeline: pipelines, users,
    /// stages, then deals. All awaits are sequential; there is no
    /// concurrent request.
    ///
    /// When the selected pipeline is not present upstream the deal fetch
    /// is skipped, leaving an empty deal list.
    pub async fn fetch_batch(&self, pipeline: &PipelineId, metrics: &MetricSet) -> FetchBatch {
        let pipelines = self.list_pipelines().await;
        let users = self.list_users().await;
        let stages = self.list_deal_stages().await;

        let deals = if pipelines.iter().any(|p| &p.id == pipeline) {
            self.list_deals(pipeline, metrics).await
        } else {
            tracing::warn!(
                pipeline = %pipeline,
                "selected pipeline not present upstream, skipping deal fetch"
            );
            Vec::new()
        };

        tracing::info!(
            pipeline = %pipeline,
            pipelines = pipelines.len(),
            users = users.len(),
            stages = stages.len(),
            deals = deals.len(),
            "fetch sequence complete"
        );

        FetchBatch {
            pipelines,
            users,
            stages,
            deals,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let client = CrmClient::new("http://localhost:9999/rest/1/token/").expect("client");
        assert_eq!(client.base_url(), "http://localhost:9999/rest/1/token");
    }

    #[test]
    fn url_joins_method_name() {
        let client = CrmClient::new("http://localhost:9999").expect("client");
        assert_eq!(
            client.url(DEAL_GET_METHOD),
            "http://localhost:9999/crm.deal.get.json"
        );
    }
}
