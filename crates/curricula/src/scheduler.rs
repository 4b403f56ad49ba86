//! Periodic batch scheduler.
//!
//! Each sweep picks up a bounded number of pending materials and runs them
//! through the orchestrator one at a time. Sweeps never overlap: a request
//! arriving while one is running is rejected, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info_span;

use crate::db::DatabaseError;
use crate::processing::{ProcessingError, ProcessingOrchestrator};

/// Default number of materials handled per sweep.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default time between sweeps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("A sweep is already in progress")]
    SweepInProgress,

    #[error("Failed to list pending materials: {0}")]
    Store(#[from] DatabaseError),
}

/// Outcome counts of one sweep. `succeeded + failed == processed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Claimed by another caller, or gone, before this sweep reached them.
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Clears the sweep flag when dropped.
struct SweepGuard<'a>(&'a AtomicBool);

impl<'a> SweepGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepGuard(flag))
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives sweeps on a fixed interval or on manual trigger.
#[derive(Clone)]
pub struct BatchScheduler {
    orchestrator: Arc<ProcessingOrchestrator>,
    batch_size: usize,
    interval: Duration,
    sweeping: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

impl BatchScheduler {
    pub fn new(orchestrator: Arc<ProcessingOrchestrator>, batch_size: usize, interval: Duration) -> Self {
        Self {
            orchestrator,
            batch_size,
            interval,
            sweeping: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeping.load(Ordering::Acquire)
    }

    /// Processes up to `batch_size` pending materials, oldest first.
    ///
    /// Individual failures are counted, never propagated. Each record is
    /// loaded on its own, so an unreadable row only fails itself.
    pub fn run_sweep(&self) -> Result<SweepSummary, SchedulerError> {
        let _guard = SweepGuard::acquire(&self.sweeping).ok_or(SchedulerError::SweepInProgress)?;
        let _span = info_span!("sweep", batch_size = self.batch_size).entered();
        let started = Instant::now();

        let pending = self.orchestrator.store().list_pending_ids(self.batch_size)?;
        if pending.is_empty() {
            log::debug!("Sweep found no pending materials");
        }

        let mut summary = SweepSummary::default();
        for id in pending {
            match self.orchestrator.process(&id) {
                Ok(_) => {
                    summary.processed += 1;
                    summary.succeeded += 1;
                }
                Err(
                    ProcessingError::AlreadyClaimed(_)
                    | ProcessingError::NotClaimable { .. }
                    | ProcessingError::NotFound(_),
                ) => {
                    summary.skipped += 1;
                }
                Err(ProcessingError::Persistence {
                    source: source @ DatabaseError::CorruptRow { .. },
                    ..
                }) => {
                    log::error!("Material {} has an unreadable record: {}", id, source);
                    summary.processed += 1;
                    summary.failed += 1;
                }
                Err(e) => {
                    log::warn!("Material {} failed: {}", id, e);
                    summary.processed += 1;
                    summary.failed += 1;
                }
            }
        }

        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log::info!(
            "Sweep finished: {} processed ({} succeeded, {} failed), {} skipped in {}ms",
            summary.processed,
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.duration_ms
        );
        Ok(summary)
    }

    /// Start the sweep loop in a background thread.
    /// Accepts a trigger receiver for manual sweep requests.
    pub fn start(&self, mut trigger_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let scheduler = self.clone();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to start scheduler runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async {
                let mut interval_timer = tokio::time::interval(scheduler.interval);
                interval_timer.tick().await; // skip immediate first tick

                log::info!(
                    "Batch scheduler started (every {}s, up to {} materials)",
                    scheduler.interval.as_secs(),
                    scheduler.batch_size
                );

                loop {
                    if scheduler.shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    tokio::select! {
                        _ = interval_timer.tick() => {},
                        Ok(()) = trigger_rx.recv() => {
                            log::info!("Manual sweep triggered");
                        },
                    }

                    if scheduler.shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    match scheduler.run_sweep() {
                        Ok(_) => {}
                        Err(SchedulerError::SweepInProgress) => {
                            log::warn!("Skipping tick: previous sweep still running");
                        }
                        Err(e) => log::error!("Sweep failed: {}", e),
                    }
                }

                log::info!("Batch scheduler stopped");
            });
        })
    }

    /// Signals the scheduler to stop after the current sweep.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
