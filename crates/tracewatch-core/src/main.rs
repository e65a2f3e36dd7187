//! Tracewatch CLI
//!
//! Command dispatch and process setup for the slow-query trace monitor.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use tracewatch::alerting::Alertmanager;
use tracewatch::config::{AlertmanagerConfig, Config, QueryConfig};
use tracewatch::models::{TimeRange, TraceQuery, TracesQuery};
use tracewatch::query::{CloudTraceBackend, TraceClient};

/// Tracewatch - slow-query alerts from Cloud Trace
#[derive(Parser)]
#[command(name = "tracewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for slow traces and forward them as alerts
    Monitor {
        /// Google Cloud project to query
        #[arg(short = 'p', long, env = "PROJECT_ID")]
        project_id: String,

        /// Latency above which a query counts as slow
        #[arg(long, default_value = "3s", value_parser = humantime::parse_duration)]
        threshold: Duration,

        /// How far back to look for slow traces
        #[arg(long, default_value = "6h", value_parser = humantime::parse_duration)]
        window: Duration,

        /// Maximum number of traces to alert on per run
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Alertmanager webhook URL
        #[arg(long, env = "ALERTMANAGER_URL")]
        alertmanager_url: String,

        /// Proxy to route alert delivery through
        #[arg(long, env = "ALERTMANAGER_PROXY_URL")]
        proxy_url: Option<String>,

        /// PEM file with a custom TLS trust root for the receiver
        #[arg(long)]
        ca_cert: Option<PathBuf>,

        /// Overall deadline for the run
        #[arg(long, default_value = "15m", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },

    /// Fetch a single trace and print it as JSON
    Show {
        /// Google Cloud project the trace belongs to
        #[arg(short = 'p', long, env = "PROJECT_ID")]
        project_id: String,

        /// Trace ID to fetch
        trace_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Monitor {
            project_id,
            threshold,
            window,
            limit,
            alertmanager_url,
            proxy_url,
            ca_cert,
            timeout,
        } => {
            let config = Config {
                query: QueryConfig {
                    project_id,
                    latency_threshold: threshold,
                    window,
                    limit,
                    ..QueryConfig::default()
                },
                alertmanager: AlertmanagerConfig {
                    url: alertmanager_url,
                    proxy_url,
                    ca_cert,
                },
                ..Config::default()
            };
            run_monitor(config, timeout).await
        }
        Commands::Show {
            project_id,
            trace_id,
        } => run_show(project_id, trace_id).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run_monitor(config: Config, timeout: Duration) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // Receiver misconfiguration aborts the run before any backend call.
    let root_cert = load_root_cert(&config.alertmanager)?;
    let alertmanager = Alertmanager::new(
        &config.alertmanager.url,
        config.alertmanager.proxy_url.as_deref(),
        root_cert,
    )?;

    let run = async {
        let backend = CloudTraceBackend::from_gce_metadata().await?;
        let client = TraceClient::new(backend).with_page_size(config.query.page_size);

        let query = TracesQuery {
            project_id: config.query.project_id.clone(),
            limit: config.query.limit,
            filter: config.query.filter(),
            time_range: TimeRange::last(config.query.window),
        };
        info!(
            project_id = %query.project_id,
            filter = %query.filter,
            limit = query.limit,
            "polling for slow traces"
        );

        let entries = client.list_traces(&query).await?;
        if entries.is_empty() {
            info!("no slow traces in window");
            return Ok(());
        }

        info!(count = entries.len(), "forwarding slow traces as alerts");
        alertmanager
            .post(&entries, config.query.latency_threshold)
            .await?;
        Ok::<(), anyhow::Error>(())
    };

    let result = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| anyhow::anyhow!("run exceeded deadline of {}", humantime::format_duration(timeout)))?;

    info!(duration = ?start.elapsed(), "monitor run finished");
    result
}

async fn run_show(project_id: String, trace_id: String) -> anyhow::Result<()> {
    let backend = CloudTraceBackend::from_gce_metadata().await?;
    let client = TraceClient::new(backend);

    let trace = client
        .get_trace(&TraceQuery {
            project_id,
            trace_id,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&trace)?);
    Ok(())
}

fn load_root_cert(config: &AlertmanagerConfig) -> anyhow::Result<Option<reqwest::Certificate>> {
    let Some(path) = &config.ca_cert else {
        return Ok(None);
    };
    let pem = std::fs::read(path)?;
    let cert = reqwest::Certificate::from_pem(&pem)
        .map_err(|e| anyhow::anyhow!("invalid CA certificate {}: {e}", path.display()))?;
    Ok(Some(cert))
}
