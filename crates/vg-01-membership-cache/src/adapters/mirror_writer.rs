//! Background mirror writer.
//!
//! Batches are queued on an unbounded channel and applied by a single task, so
//! they reach the store in submission order. The task exits once every handle
//! is dropped and the queue is drained.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shared_store::SortedSetStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::MirrorBatch;

/// Outcome of a writer run, returned when its task completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterReport {
    pub batches_applied: u64,
    pub batches_failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    applied: AtomicU64,
    failed: AtomicU64,
}

/// Submission side of a [`MirrorWriter`].
#[derive(Debug, Clone)]
pub struct MirrorWriterHandle {
    sender: mpsc::UnboundedSender<MirrorBatch>,
    counters: Arc<Counters>,
}

impl MirrorWriterHandle {
    /// Queues `batch`. Hands it back if the writer task has stopped.
    pub fn submit(&self, batch: MirrorBatch) -> Result<(), MirrorBatch> {
        self.sender.send(batch).map_err(|e| e.0)
    }

    /// Batches the writer has failed to apply so far.
    pub fn failed_batches(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    pub fn applied_batches(&self) -> u64 {
        self.counters.applied.load(Ordering::Relaxed)
    }
}

/// Applies queued mirror batches against a [`SortedSetStore`].
pub struct MirrorWriter<S: SortedSetStore> {
    store: Arc<S>,
    store_timeout: Duration,
    receiver: mpsc::UnboundedReceiver<MirrorBatch>,
    counters: Arc<Counters>,
}

impl<S: SortedSetStore + 'static> MirrorWriter<S> {
    /// Spawns the writer task on the current runtime.
    pub fn spawn(store: Arc<S>, store_timeout: Duration) -> (MirrorWriterHandle, JoinHandle<WriterReport>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        let writer = Self {
            store,
            store_timeout,
            receiver,
            counters: counters.clone(),
        };
        let task = tokio::spawn(writer.run());
        (MirrorWriterHandle { sender, counters }, task)
    }

    async fn run(mut self) -> WriterReport {
        debug!("Mirror writer started");

        while let Some(batch) = self.receiver.recv().await {
            // Failures are logged per write inside `apply`.
            match batch.apply(self.store.as_ref(), self.store_timeout).await {
                Ok(()) => self.counters.applied.fetch_add(1, Ordering::Relaxed),
                Err(_) => self.counters.failed.fetch_add(1, Ordering::Relaxed),
            };
        }

        let report = WriterReport {
            batches_applied: self.counters.applied.load(Ordering::Relaxed),
            batches_failed: self.counters.failed.load(Ordering::Relaxed),
        };
        info!(
            applied = report.batches_applied,
            failed = report.batches_failed,
            "Mirror writer drained"
        );
        report
    }
}
