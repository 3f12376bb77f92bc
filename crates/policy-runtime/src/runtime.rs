//! Startup wiring: broadcaster, optional mirror writer, pipeline.
//!
//! ## Startup Sequence
//!
//! 1. Validate the broadcaster configuration
//! 2. Spawn the mirror writer (write-behind mode)
//! 3. Load remembered senders; abort unless cold start is allowed
//! 4. Assemble the pipeline: vanish, then allow-list

use std::sync::Arc;
use std::time::Duration;

use shared_store::{SortedSetStore, StreamAppender};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vg_01_membership_cache::{CacheError, MirrorWriter, WriterReport};
use vg_02_vanish_broadcaster::{ConfigError, VanishBroadcaster};

use crate::config::PolicyConfig;
use crate::policies::{AllowListPolicy, Pipeline, VanishPolicy};

/// Bound on waiting for queued mirror writes at shutdown.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Failures that prevent serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid policy configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not load vanished senders (set VANISH_ALLOW_COLD_START=true to serve anyway): {0}")]
    Initialize(#[source] CacheError),
}

/// A ready pipeline plus the writer task to drain at shutdown.
pub struct Runtime {
    pub pipeline: Pipeline,
    pub writer: Option<JoinHandle<WriterReport>>,
    /// Senders loaded from the mirror; `None` after a cold start.
    pub loaded: Option<usize>,
}

impl Runtime {
    pub async fn start<S, A>(config: &PolicyConfig, mirror: Arc<S>, stream: Arc<A>) -> Result<Self, StartupError>
    where
        S: SortedSetStore + 'static,
        A: StreamAppender + 'static,
    {
        let mut broadcaster = VanishBroadcaster::new(config.broadcaster_config(), mirror.clone(), stream)?;

        let writer = if config.write_behind {
            let (handle, task) = MirrorWriter::spawn(mirror, config.store_timeout);
            broadcaster = broadcaster.with_write_behind(handle);
            Some(task)
        } else {
            None
        };

        let loaded = match broadcaster.initialize().await {
            Ok(count) => Some(count),
            Err(e) if config.allow_cold_start => {
                warn!(error = %e, "Starting with an empty vanish cache; previously vanished senders are not filtered");
                None
            }
            Err(e) => return Err(StartupError::Initialize(e)),
        };

        let mut pipeline = Pipeline::new().with(VanishPolicy::new(broadcaster));
        if config.allow_list_enabled {
            pipeline = pipeline.with(AllowListPolicy::default());
        }

        info!(
            relay = %config.relay_url,
            policies = ?pipeline.names(),
            write_behind = config.write_behind,
            "Policy pipeline ready"
        );

        Ok(Self {
            pipeline,
            writer,
            loaded,
        })
    }

    /// Drops the pipeline and waits for queued mirror writes.
    pub async fn shutdown(self) -> Option<WriterReport> {
        drop(self.pipeline);
        let task = self.writer?;

        match tokio::time::timeout(DRAIN_TIMEOUT, task).await {
            Ok(Ok(report)) => Some(report),
            Ok(Err(e)) => {
                warn!(error = %e, "Mirror writer task failed");
                None
            }
            Err(_) => {
                warn!(after_secs = DRAIN_TIMEOUT.as_secs(), "Gave up waiting for mirror writes");
                None
            }
        }
    }
}
