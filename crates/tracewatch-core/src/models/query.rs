//! Query parameter types for the trace query engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inclusive time window for a trace listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the window
    pub from: DateTime<Utc>,
    /// End of the window
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Window ending now and reaching `window` into the past
    pub fn last(window: std::time::Duration) -> Self {
        let to = Utc::now();
        let from = to - chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        Self { from, to }
    }
}

/// Parameters for a single-trace lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceQuery {
    /// Project the trace belongs to
    pub project_id: String,
    /// Trace identifier to fetch
    pub trace_id: String,
}

impl TraceQuery {
    /// Check required fields before issuing any backend call
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() {
            return Err(Error::validation("project_id is required"));
        }
        if self.trace_id.is_empty() {
            return Err(Error::validation("trace_id is required"));
        }
        Ok(())
    }
}

/// Parameters for a trace listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracesQuery {
    /// Project to query
    pub project_id: String,

    /// Upper bound on the total number of traces returned across all pages
    pub limit: usize,

    /// Backend filter expression, e.g. `latency:3s`
    pub filter: String,

    /// Time window the traces must start within
    pub time_range: TimeRange,
}

impl TracesQuery {
    /// Check invariants before issuing any backend call
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_empty() {
            return Err(Error::validation("project_id is required"));
        }
        if self.limit == 0 {
            return Err(Error::validation("limit must be greater than zero"));
        }
        if self.time_range.from > self.time_range.to {
            return Err(Error::validation(format!(
                "time range start {} is after end {}",
                self.time_range.from, self.time_range.to
            )));
        }
        Ok(())
    }
}
