//! # Tracewatch
//!
//! Slow-query monitoring for Cloud Trace.
//!
//! Tracewatch polls the Cloud Trace backend for traces matching a latency
//! filter inside a time window and forwards each match as a firing alert to
//! an Alertmanager-compatible webhook receiver.
//!
//! ## Architecture
//!
//! - **Query engine**: time-windowed, filtered, paginated trace listing plus
//!   single-trace lookup against the Cloud Trace v1 REST API
//! - **Alert forwarder**: trace-to-alert translation and webhook delivery,
//!   optionally through a proxy and/or a custom TLS trust root
//!
//! ## Quick Start
//!
//! ```bash
//! export ALERTMANAGER_URL=http://127.0.0.1:9093/api/v2/alerts/
//! tracewatch monitor --project-id my-project --threshold 3s --window 6h
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod alerting;
pub mod config;
pub mod error;
pub mod models;
pub mod query;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::Alertmanager;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::query::{CloudTraceBackend, TraceBackend, TraceClient};
}
