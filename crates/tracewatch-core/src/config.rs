//! Configuration management for Tracewatch
//!
//! All tunables live in an explicit struct passed into the components at
//! construction time; nothing in the core reads the environment directly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trace query configuration
    pub query: QueryConfig,

    /// Alertmanager receiver configuration
    pub alertmanager: AlertmanagerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Trace query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Google Cloud project to query
    pub project_id: String,

    /// Latency above which a query counts as slow
    #[serde(with = "humantime_serde")]
    pub latency_threshold: Duration,

    /// How far back to look for slow traces
    #[serde(with = "humantime_serde")]
    pub window: Duration,

    /// Maximum number of traces to collect across all pages
    pub limit: usize,

    /// Page size requested per backend fetch
    pub page_size: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            latency_threshold: Duration::from_secs(3),
            window: Duration::from_secs(6 * 60 * 60),
            limit: 10,
            page_size: 10,
        }
    }
}

impl QueryConfig {
    /// Backend filter expression derived from the latency threshold.
    ///
    /// The same threshold parameterizes the alert description, so the filter
    /// and the annotation can never disagree.
    pub fn filter(&self) -> String {
        format!("latency:{}", humantime::format_duration(self.latency_threshold))
    }
}

/// Alertmanager receiver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertmanagerConfig {
    /// Webhook URL to POST alerts to
    pub url: String,

    /// Optional proxy to route delivery through
    pub proxy_url: Option<String>,

    /// Optional PEM file with a custom TLS trust root
    pub ca_cert: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_tracks_threshold() {
        let config = QueryConfig {
            latency_threshold: Duration::from_secs(3),
            ..QueryConfig::default()
        };
        assert_eq!(config.filter(), "latency:3s");

        let config = QueryConfig {
            latency_threshold: Duration::from_millis(500),
            ..QueryConfig::default()
        };
        assert_eq!(config.filter(), "latency:500ms");
    }
}
