//! Pagination driver over a [`TraceBackend`]

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Trace, TraceQuery, TracesQuery};

use super::backend::{ListTracesRequest, TraceBackend, TraceView};

const DEFAULT_PAGE_SIZE: usize = 10;

/// Trace query engine.
///
/// Validates logical queries, drives cursor pagination sequentially, and
/// enforces the total-result limit. Performs no retries; retry policy, if
/// any, belongs to the caller.
pub struct TraceClient<B> {
    backend: B,
    page_size: usize,
}

impl<B: TraceBackend> TraceClient<B> {
    /// Create a client over the given backend
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the per-fetch page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// List traces matching the query, most recent first.
    ///
    /// Returns at most `query.limit` traces; page fetching stops as soon as
    /// the limit is reached, even mid-page. If a later page fetch fails, the
    /// error is logged and the prefix collected so far is returned.
    pub async fn list_traces(&self, query: &TracesQuery) -> Result<Vec<Trace>> {
        query.validate()?;

        let mut entries: Vec<Trace> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let remaining = query.limit - entries.len();
            let request = ListTracesRequest {
                project_id: query.project_id.clone(),
                page_size: self.page_size.min(remaining),
                start_time: query.time_range.from,
                end_time: query.time_range.to,
                filter: query.filter.clone(),
                order_by: "start desc".to_string(),
                view: TraceView::Complete,
                page_token: page_token.take(),
            };

            let page = match self.backend.list_traces(&request).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        project_id = %query.project_id,
                        collected = entries.len(),
                        error = %e,
                        "page fetch failed, returning partial results"
                    );
                    return Ok(entries);
                }
            };

            debug!(
                project_id = %query.project_id,
                page_len = page.traces.len(),
                collected = entries.len(),
                "fetched trace page"
            );

            for trace in page.traces {
                entries.push(trace);
                if entries.len() >= query.limit {
                    return Ok(entries);
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(entries)
    }

    /// Fetch a single trace by project and trace identifier
    pub async fn get_trace(&self, query: &TraceQuery) -> Result<Trace> {
        query.validate()?;
        self.backend
            .get_trace(&query.project_id, &query.trace_id)
            .await
    }
}
