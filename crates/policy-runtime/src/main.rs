//! Relay write-policy entry point.
//!
//! 1. Initialize telemetry (stderr only)
//! 2. Load configuration from the environment
//! 3. Connect to the durable store and load vanished senders
//! 4. Serve stdin/stdout until EOF or Ctrl+C
//! 5. Drain queued mirror writes

use std::sync::Arc;

use anyhow::{Context, Result};
use policy_runtime::{serve, PolicyConfig, Runtime};
use shared_store::RedisStore;
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use vg_telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> Result<()> {
    vg_telemetry::init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = PolicyConfig::from_env().context("Invalid configuration")?;
    info!(
        relay = %config.relay_url,
        capacity = config.cache_capacity,
        "Starting vanish-gate policy"
    );

    let store = Arc::new(
        RedisStore::connect(&config.redis_url)
            .await
            .context("Failed to connect to the durable store")?,
    );
    let mut runtime = Runtime::start(&config, store.clone(), store)
        .await
        .context("Failed to start policy pipeline")?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    let served = tokio::select! {
        result = serve(stdin, stdout, &mut runtime.pipeline) => result.map(Some),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted; shutting down");
            Ok(None)
        }
    };

    match runtime.shutdown().await {
        Some(report) => info!(
            applied = report.batches_applied,
            failed = report.batches_failed,
            "Mirror writes drained"
        ),
        None => debug!("No mirror writer to drain"),
    }

    match vg_telemetry::encode_metrics() {
        Ok(metrics) => info!(metrics = %metrics, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    if let Some(report) = served.context("Host connection failed")? {
        info!(
            lines = report.lines,
            replies = report.replies,
            malformed = report.malformed,
            "Host input closed"
        );
    }
    Ok(())
}
