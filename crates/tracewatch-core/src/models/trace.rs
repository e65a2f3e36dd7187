//! Trace and span data models
//!
//! Wire shapes follow the Cloud Trace v1 REST representation (camelCase
//! fields, RFC3339 span timestamps, span IDs as decimal strings).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Kind of span as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpanKind {
    /// Kind not set
    #[default]
    #[serde(rename = "SPAN_KIND_UNSPECIFIED")]
    Unspecified,
    /// Server-side RPC handling
    #[serde(rename = "RPC_SERVER")]
    RpcServer,
    /// Client-side RPC call
    #[serde(rename = "RPC_CLIENT")]
    RpcClient,
}

/// A span is a single timed operation within a trace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Span identifier, unique within the trace
    pub span_id: String,

    /// Kind of span
    #[serde(default)]
    pub kind: SpanKind,

    /// Name of the operation
    #[serde(default)]
    pub name: String,

    /// When the operation started
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    /// When the operation ended
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,

    /// Parent span identifier, absent on the root span
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,

    /// Key-value labels attached to the span
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Span {
    /// Duration of the operation, if both timestamps are present
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// A trace is a recorded execution path composed of one or more spans
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Project the trace belongs to
    #[serde(default)]
    pub project_id: String,

    /// Trace identifier (32-char hex)
    pub trace_id: String,

    /// Spans in this trace; a well-formed trace has at least one
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl Trace {
    /// First span of the trace.
    ///
    /// A trace with zero spans violates the backend contract; surfacing it
    /// as a [`Error::DataIntegrity`] keeps the violation out of the alert
    /// pipeline instead of risking an out-of-bounds access.
    pub fn root_span(&self) -> Result<&Span> {
        self.spans
            .first()
            .ok_or_else(|| Error::data_integrity(format!("trace {} has no spans", self.trace_id)))
    }
}
