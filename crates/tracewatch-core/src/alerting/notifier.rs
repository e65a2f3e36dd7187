//! Webhook delivery of slow-query alerts

use chrono::Utc;
use reqwest::{Certificate, Client, Proxy};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::models::{Alert, Trace};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Forwarder for an Alertmanager-compatible webhook receiver.
///
/// Immutable after construction; the proxy and trust root are baked into the
/// underlying HTTP client when the forwarder is built.
#[derive(Debug)]
pub struct Alertmanager {
    url: Url,
    client: Client,
}

impl Alertmanager {
    /// Create a forwarder for the given webhook URL.
    ///
    /// `hook_url` must be an absolute http(s) URL. `proxy_url`, if set,
    /// routes all delivery through that proxy. `root_cert`, if set, is added
    /// to the trust store used to validate the receiver's TLS certificate;
    /// otherwise the system default store applies.
    pub fn new(
        hook_url: &str,
        proxy_url: Option<&str>,
        root_cert: Option<Certificate>,
    ) -> Result<Self> {
        let url = Url::parse(hook_url)
            .map_err(|e| Error::invalid_config(format!("invalid Alertmanager URL {hook_url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(Error::invalid_config(format!(
                "invalid Alertmanager URL {hook_url}: not an absolute http(s) URL"
            )));
        }

        let mut builder = Client::builder().timeout(DELIVERY_TIMEOUT);
        if let Some(proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::invalid_config(format!("invalid proxy URL {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        if let Some(cert) = root_cert {
            builder = builder.add_root_certificate(cert);
        }
        let client = builder
            .build()
            .map_err(|e| Error::invalid_config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { url, client })
    }

    /// Translate the traces into firing alerts and deliver them in one POST.
    ///
    /// One alert per trace. Traces violating the non-empty-spans invariant
    /// are skipped with a logged data-integrity error; well-formed siblings
    /// are still delivered. Single best-effort attempt, no retry.
    pub async fn post(&self, traces: &[Trace], threshold: Duration) -> Result<()> {
        let mut payload = Vec::with_capacity(traces.len());
        for trace in traces {
            match Alert::for_slow_trace(trace, threshold, Utc::now()) {
                Ok(alert) => payload.push(alert),
                Err(e) => {
                    warn!(trace_id = %trace.trace_id, error = %e, "skipping malformed trace");
                }
            }
        }

        if payload.is_empty() {
            info!("no alerts to deliver");
            return Ok(());
        }

        let response = self
            .client
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::delivery(format!("webhook POST failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::delivery(format!(
                "receiver returned {status}: {body}"
            )));
        }

        info!(count = payload.len(), url = %self.url, "alerts delivered");
        Ok(())
    }
}
