//! Trace query engine
//!
//! Translates a logical time-range + filter + limit request into paginated
//! Cloud Trace list calls and exposes single-trace lookup.

mod auth;
mod backend;
mod client;

pub use backend::{CloudTraceBackend, ListTracesRequest, TraceBackend, TracePage, TraceView};
pub use client::TraceClient;
