//! Data models for traces, queries, and alert records

mod alert;
mod query;
mod trace;

pub use alert::{Alert, AlertTime, ALERT_NAME};
pub use query::{TimeRange, TraceQuery, TracesQuery};
pub use trace::{Span, SpanKind, Trace};
