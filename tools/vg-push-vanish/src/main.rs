//! vg-push-vanish: manual vanish request submission.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use shared_store::RedisStore;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use vg_push_vanish::{build_record, is_confirmation, preview, push, Args};
use vg_telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    vg_telemetry::init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let record = build_record(&args, now_secs);
    let shown = preview(&record);

    if !args.yes && !confirm(&shown).await? {
        println!("\nCanceled");
        return Ok(());
    }

    let store = RedisStore::connect(&args.redis_url)
        .await
        .context("Failed to connect to the durable store")?;
    let stream_id = push(&store, &record)
        .await
        .context("Failed to push vanish request")?;

    info!(pubkey = %record.identifier, stream_id = %stream_id, "Vanish request pushed");
    println!(
        "Vanish request pushed successfully for pubkey '{}'. Stream ID: {}",
        record.identifier, stream_id
    );
    println!("Event: {shown}");
    Ok(())
}

async fn confirm(shown: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("\nAre you sure you want to create this vanish request?\n{shown}\n(y/N): ").as_bytes())
        .await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(is_confirmation(&answer))
}
