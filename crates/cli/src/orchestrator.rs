//! Sync loop
//!
//! Establish watches once, then sync and wait for quiescence forever. Watches
//! are released on every way out: shutdown request, broken notification
//! stream, or an error while establishing them.

use anyhow::{Context, Result};
use resync_core::{SyncConfig, SyncInvoker};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use watcher::{ChangeAggregator, ChangeMask, DebounceConfig, Notifier, Quiescence, WatchManager};

/// Where the orchestrator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Syncing,
    AwaitingQuiescence,
    ShuttingDown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initializing => "initializing",
            Phase::Syncing => "syncing",
            Phase::AwaitingQuiescence => "awaiting quiescence",
            Phase::ShuttingDown => "shutting down",
        };
        f.write_str(name)
    }
}

/// Counters over the lifetime of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Sync passes started
    pub passes: usize,
    /// Passes that failed
    pub failed_passes: usize,
    /// Current streak of failed passes
    pub consecutive_failures: usize,
}

/// Owns the watch → sync lifecycle
pub struct Orchestrator<I: SyncInvoker> {
    config: SyncConfig,
    aggregator: ChangeAggregator,
    invoker: I,
    running: Arc<AtomicBool>,
    phase: Phase,
    stats: RunStats,
}

impl<I: SyncInvoker> Orchestrator<I> {
    pub fn new(
        config: SyncConfig,
        debounce: DebounceConfig,
        invoker: I,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            aggregator: ChangeAggregator::new(debounce),
            invoker,
            running,
            phase: Phase::Initializing,
            stats: RunStats::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run until shutdown is requested or the event stream breaks
    ///
    /// Failing to establish watches is fatal and happens before any sync.
    /// Failed sync passes are logged and retried after the next quiescence.
    pub fn run<N: Notifier>(&mut self, notifier: N) -> Result<()> {
        self.enter(Phase::Initializing);
        let established =
            WatchManager::establish(notifier, self.config.source(), ChangeMask::SYNC_TRIGGERS)
                .with_context(|| format!("Failed to watch {}", self.config.source.display()));
        let mut watches = match established {
            Ok(watches) => watches,
            Err(e) => {
                self.enter(Phase::ShuttingDown);
                return Err(e);
            }
        };

        info!(
            "Watching {} directories under {}",
            watches.watches().len(),
            self.config.source.display()
        );

        let outcome = self.sync_loop(&mut watches);

        self.enter(Phase::ShuttingDown);
        let report = watches.release();
        if report.failed > 0 {
            warn!(
                "{} of {} watches could not be released",
                report.failed,
                report.released + report.failed
            );
        } else {
            debug!("Released {} watches", report.released);
        }

        outcome
    }

    fn sync_loop<N: Notifier>(&mut self, watches: &mut WatchManager<N>) -> Result<()> {
        while self.running.load(Ordering::SeqCst) {
            self.enter(Phase::Syncing);
            self.sync_once();

            self.enter(Phase::AwaitingQuiescence);
            let quiescence = self
                .aggregator
                .await_quiescence(watches.notifier_mut(), &self.running)
                .context("File change notification failed")?;

            match quiescence {
                Quiescence::Settled { events } => {
                    debug!("{} change events since last sync", events);
                }
                Quiescence::Interrupted => break,
            }
        }

        info!("Stopping");
        Ok(())
    }

    fn sync_once(&mut self) {
        info!("Synchronizing...");
        self.stats.passes += 1;

        match self.invoker.run_sync(&self.config) {
            Ok(report) => {
                self.stats.consecutive_failures = 0;
                info!("Sync finished in {:.1?}", report.elapsed);
            }
            Err(e) => {
                self.stats.failed_passes += 1;
                self.stats.consecutive_failures += 1;
                error!("Sync failed: {}", e);
                if self.stats.consecutive_failures > 1 {
                    warn!(
                        "{} consecutive sync passes have failed, retrying after the next change",
                        self.stats.consecutive_failures
                    );
                }
            }
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!("State: {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}
