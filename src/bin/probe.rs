//! Collector probe - auxiliary binary
//!
//! Records a handful of demo interaction events and performs a real flush
//! against a collector endpoint. Useful for verifying collector
//! connectivity and payload shape end to end.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Map};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use interlog::{CollectorConfig, InteractionLogBuffer};

/// Command-line arguments for interlog-probe
#[derive(Parser, Debug)]
#[command(name = "interlog-probe")]
#[command(about = "Send a demo interaction batch to a collector")]
#[command(version)]
struct Args {
    /// Collector base URL (e.g. https://collector.example)
    #[arg(short, long, env = "INTERLOG_API_BASE")]
    api_base: Option<String>,

    /// Number of demo events to record
    #[arg(short = 'n', long, default_value = "3")]
    count: usize,

    /// Grace period in seconds to wait for delivery
    #[arg(short, long, default_value = "5")]
    grace: u64,

    /// Keep running and flush on a teardown signal (Ctrl+C / SIGTERM)
    /// instead of flushing immediately
    #[arg(short, long)]
    wait: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interlog=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = CollectorConfig::load(args.api_base.as_deref())
        .context("Failed to load collector configuration")?;
    if config.api_base.is_empty() {
        anyhow::bail!(
            "No collector base URL configured (pass --api-base or set INTERLOG_API_BASE)"
        );
    }

    info!(url = %config.collector_url(), "Probing collector");

    let buffer = Arc::new(
        InteractionLogBuffer::with_collector(&config)
            .context("Failed to construct delivery transports")?,
    );

    let session_id = Uuid::new_v4();
    for sequence in 0..args.count {
        let mut data = Map::new();
        data.insert("sessionId".to_string(), json!(session_id.to_string()));
        data.insert("sequence".to_string(), json!(sequence));
        buffer.record("probe_event", data);
    }
    let grace = Duration::from_secs(args.grace);
    if args.wait {
        info!(
            events = args.count,
            %session_id,
            "Recorded demo events; send a teardown signal to flush"
        );
        interlog::lifecycle::run_until_teardown(Arc::clone(&buffer), grace).await;
    } else {
        info!(events = args.count, %session_id, "Recorded demo events; flushing");
        buffer.flush();
        buffer.drain(grace).await;
    }

    let remaining = buffer.buffered_len();
    if remaining > 0 {
        anyhow::bail!("{remaining} events still buffered after grace period");
    }
    info!("Batch handed off to collector");
    Ok(())
}
