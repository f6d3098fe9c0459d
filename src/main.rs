//! groupsync operator entrypoint.
//!
//! Loads source descriptors from a YAML config file into the in-memory
//! object store and drives the reconciliation loop until interrupted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::info;

use groupsync_controller::{
    InMemoryObjectStore, LogMembershipSync, LoopConfig, ReconcilerBuilder, ReconcilerConfig,
    ReconciliationLoop,
};
use groupsync_core::SourceDescriptor;
use groupsync_pipeline::HttpFetcher;

#[derive(Debug, Parser)]
#[command(name = "groupsync", about = "Converge group memberships from remote subject lists")]
struct Args {
    /// Path to the controller config file.
    #[arg(short, long, default_value = "groupsync.yaml")]
    config: PathBuf,
}

/// On-disk controller configuration.
#[derive(Debug, Deserialize)]
struct Config {
    /// Seconds before a fetch is abandoned.
    #[serde(default = "default_fetch_deadline_secs")]
    fetch_deadline_secs: u64,
    /// Seconds to wait before retrying a failed run.
    #[serde(default = "default_retry_delay_secs")]
    retry_delay_secs: u64,
    /// Seconds between full resyncs; 0 disables periodic resync.
    #[serde(default = "default_resync_interval_secs")]
    resync_interval_secs: u64,
    /// Descriptors keyed by group name.
    sources: HashMap<String, SourceDescriptor>,
}

const fn default_fetch_deadline_secs() -> u64 {
    30
}

const fn default_retry_delay_secs() -> u64 {
    60
}

const fn default_resync_interval_secs() -> u64 {
    300
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading config file {}", args.config.display()))?;
    let config: Config = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", args.config.display()))?;

    info!(sources = config.sources.len(), "Starting groupsync");

    let keys: Vec<String> = config.sources.keys().cloned().collect();
    let store = Arc::new(InMemoryObjectStore::with_sources(config.sources));

    let reconciler = ReconcilerBuilder::new()
        .with_fetcher(Arc::new(HttpFetcher::new()?))
        .with_store(store)
        .with_membership(Arc::new(LogMembershipSync::new()))
        .with_config(ReconcilerConfig {
            fetch_deadline: Duration::from_secs(config.fetch_deadline_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
        .build()?;

    let loop_config = LoopConfig {
        resync_interval: (config.resync_interval_secs > 0)
            .then(|| Duration::from_secs(config.resync_interval_secs)),
        ..Default::default()
    };
    let (runner, handle) = ReconciliationLoop::new(Arc::new(reconciler), loop_config);
    let join = tokio::spawn(runner.run());

    for key in keys {
        handle.enqueue(key).await?;
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutting down");
    handle.stop();
    join.await.context("joining reconciliation loop")?;

    Ok(())
}
