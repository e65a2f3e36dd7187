//! Trace backend interface and the Cloud Trace v1 REST implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::models::Trace;

use super::auth;

const CLOUD_TRACE_BASE_URL: &str = "https://cloudtrace.googleapis.com/";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Level of detail requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceView {
    /// Trace IDs only
    Minimal,
    /// Root span per trace
    RootSpan,
    /// Full span detail
    #[default]
    Complete,
}

impl TraceView {
    fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "MINIMAL",
            Self::RootSpan => "ROOTSPAN",
            Self::Complete => "COMPLETE",
        }
    }
}

/// One page-sized list request against the backend
#[derive(Debug, Clone)]
pub struct ListTracesRequest {
    /// Project to query
    pub project_id: String,
    /// Number of traces requested for this page
    pub page_size: usize,
    /// Only traces starting at or after this instant
    pub start_time: DateTime<Utc>,
    /// Only traces starting at or before this instant
    pub end_time: DateTime<Utc>,
    /// Backend filter expression
    pub filter: String,
    /// Result ordering, e.g. `start desc`
    pub order_by: String,
    /// Level of span detail
    pub view: TraceView,
    /// Continuation cursor from the previous page, if any
    pub page_token: Option<String>,
}

/// One page of list results
#[derive(Debug, Clone, Default)]
pub struct TracePage {
    /// Traces on this page, in backend order
    pub traces: Vec<Trace>,
    /// Cursor for the next page; `None` means end of stream
    pub next_page_token: Option<String>,
}

/// Backend trace store the query engine drives.
///
/// The seam exists so pagination can be exercised against an in-process
/// mock; production uses [`CloudTraceBackend`].
#[async_trait]
pub trait TraceBackend: Send + Sync {
    /// Fetch one page of traces
    async fn list_traces(&self, request: &ListTracesRequest) -> Result<TracePage>;

    /// Fetch a single trace by identifier
    async fn get_trace(&self, project_id: &str, trace_id: &str) -> Result<Trace>;
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListTracesResponse {
    #[serde(default)]
    traces: Vec<Trace>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Cloud Trace v1 REST client authenticated with ambient GCE credentials
pub struct CloudTraceBackend {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
}

impl CloudTraceBackend {
    /// Resolve instance credentials from the GCE metadata server and build
    /// a backend client. Credential resolution failure is fatal.
    pub async fn from_gce_metadata() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::init(format!("failed to build HTTP client: {e}")))?;

        let access_token = auth::fetch_access_token(&http, auth::METADATA_TOKEN_URL).await?;

        let base_url = Url::parse(CLOUD_TRACE_BASE_URL)
            .map_err(|e| Error::init(format!("bad backend base URL: {e}")))?;

        Ok(Self {
            http,
            base_url,
            access_token,
        })
    }

    /// Build a backend client against an explicit endpoint with a
    /// pre-resolved token. Used by tests and non-GCE environments.
    pub fn with_endpoint(base_url: &str, access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::init(format!("failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| Error::init(format!("bad backend base URL {base_url}: {e}")))?;

        Ok(Self {
            http,
            base_url,
            access_token: access_token.into(),
        })
    }

    fn traces_url(&self, project_id: &str) -> Result<Url> {
        self.base_url
            .join(&format!("v1/projects/{project_id}/traces"))
            .map_err(|e| Error::backend(format!("bad project id {project_id}: {e}")))
    }
}

#[async_trait]
impl TraceBackend for CloudTraceBackend {
    async fn list_traces(&self, request: &ListTracesRequest) -> Result<TracePage> {
        let url = self.traces_url(&request.project_id)?;

        let page_size = request.page_size.to_string();
        let start_time = request.start_time.to_rfc3339();
        let end_time = request.end_time.to_rfc3339();

        let mut http_request = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("view", request.view.as_str()),
                ("pageSize", page_size.as_str()),
                ("startTime", start_time.as_str()),
                ("endTime", end_time.as_str()),
                ("filter", request.filter.as_str()),
                ("orderBy", request.order_by.as_str()),
            ]);
        if let Some(token) = &request.page_token {
            http_request = http_request.query(&[("pageToken", token.as_str())]);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| Error::backend(format!("list traces request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(format!(
                "list traces returned {status}: {body}"
            )));
        }

        let page: ListTracesResponse = response
            .json()
            .await
            .map_err(|e| Error::backend(format!("malformed list response: {e}")))?;

        Ok(TracePage {
            traces: page.traces,
            next_page_token: page.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn get_trace(&self, project_id: &str, trace_id: &str) -> Result<Trace> {
        let url = self
            .base_url
            .join(&format!("v1/projects/{project_id}/traces/{trace_id}"))
            .map_err(|e| Error::backend(format!("bad trace id {trace_id}: {e}")))?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| Error::backend(format!("get trace request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found("trace", trace_id));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(format!("get trace returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::backend(format!("malformed trace response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ListTracesRequest {
        ListTracesRequest {
            project_id: "my-project".to_string(),
            page_size: 2,
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap(),
            filter: "latency:3s".to_string(),
            order_by: "start desc".to_string(),
            view: TraceView::Complete,
            page_token: None,
        }
    }

    #[tokio::test]
    async fn list_sends_expected_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/my-project/traces"))
            .and(header("authorization", "Bearer test-token"))
            .and(query_param("view", "COMPLETE"))
            .and(query_param("pageSize", "2"))
            .and(query_param("filter", "latency:3s"))
            .and(query_param("orderBy", "start desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "traces": [
                    {"projectId": "my-project", "traceId": "aaa", "spans": [{"spanId": "1"}]}
                ],
                "nextPageToken": "cursor-1"
            })))
            .mount(&server)
            .await;

        let backend = CloudTraceBackend::with_endpoint(&server.uri(), "test-token").unwrap();
        let page = backend.list_traces(&request()).await.unwrap();

        assert_eq!(page.traces.len(), 1);
        assert_eq!(page.traces[0].trace_id, "aaa");
        assert_eq!(page.next_page_token.as_deref(), Some("cursor-1"));
    }

    #[tokio::test]
    async fn list_forwards_the_page_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/my-project/traces"))
            .and(query_param("pageToken", "cursor-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "traces": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = CloudTraceBackend::with_endpoint(&server.uri(), "test-token").unwrap();
        let mut req = request();
        req.page_token = Some("cursor-1".to_string());
        let page = backend.list_traces(&req).await.unwrap();

        assert!(page.traces.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn get_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/my-project/traces/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = CloudTraceBackend::with_endpoint(&server.uri(), "test-token").unwrap();
        let err = backend.get_trace("my-project", "missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_returns_the_trace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/projects/my-project/traces/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "projectId": "my-project",
                "traceId": "abc",
                "spans": [{"spanId": "1", "labels": {"query": "SELECT 1"}}]
            })))
            .mount(&server)
            .await;

        let backend = CloudTraceBackend::with_endpoint(&server.uri(), "test-token").unwrap();
        let trace = backend.get_trace("my-project", "abc").await.unwrap();
        assert_eq!(trace.trace_id, "abc");
        assert_eq!(trace.spans[0].labels["query"], "SELECT 1");
    }

    #[tokio::test]
    async fn auth_failure_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let backend = CloudTraceBackend::with_endpoint(&server.uri(), "stale").unwrap();
        let err = backend.list_traces(&request()).await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }
}
