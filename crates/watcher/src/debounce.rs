//! Settle-time debouncing
//!
//! Collapses a burst of change events into a single "tree is quiescent"
//! signal. While idle the notifier is polled with a short timeout so the
//! first event is seen promptly; once anything has changed the timeout grows
//! to the full settle period, and the first poll that comes back empty ends
//! the wait. Sync frequency is therefore bounded by one pass per settle period
//! of silence.

use crate::notifier::Notifier;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Poll timeout while nothing has changed yet
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(100);

/// Default settle period
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(1);

/// Timing policy for the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Poll timeout before the first event of a cycle
    pub idle_poll: Duration,
    /// Required silence after the last event
    pub settle: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

impl DebounceConfig {
    pub fn new(settle: Duration) -> Self {
        Self {
            idle_poll: DEFAULT_IDLE_POLL,
            settle,
        }
    }

    pub fn with_idle_poll(mut self, idle_poll: Duration) -> Self {
        self.idle_poll = idle_poll;
        self
    }
}

/// Per-cycle debounce state
///
/// Reset at the start of every wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleState {
    has_pending_change: bool,
    current_timeout: Duration,
    settle: Duration,
}

impl SettleState {
    pub fn new(config: &DebounceConfig) -> Self {
        Self {
            has_pending_change: false,
            current_timeout: config.idle_poll,
            settle: config.settle,
        }
    }

    pub fn has_pending_change(&self) -> bool {
        self.has_pending_change
    }

    /// Timeout for the next poll
    pub fn current_timeout(&self) -> Duration {
        self.current_timeout
    }

    /// Whether a poll returning `batch_len` events ends the wait
    pub fn is_quiescent(&self, batch_len: usize) -> bool {
        batch_len == 0 && self.has_pending_change
    }

    /// Account for a poll that returned `batch_len` events
    pub fn observe(&mut self, batch_len: usize) {
        if batch_len > 0 {
            self.has_pending_change = true;
            self.current_timeout = self.settle;
        }
    }
}

/// How a wait for quiescence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quiescence {
    /// Changes were seen and then nothing for a full settle period
    Settled {
        /// Events observed during the cycle
        events: usize,
    },
    /// Shutdown was requested before the tree settled
    Interrupted,
}

/// Turns the raw event stream into quiescence signals
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeAggregator {
    config: DebounceConfig,
}

impl ChangeAggregator {
    pub fn new(config: DebounceConfig) -> Self {
        Self { config }
    }

    /// Block until the tree has changed and then gone quiet
    ///
    /// Never returns `Settled` without at least one event: with no activity it
    /// keeps polling at the idle interval until `running` is cleared. Read
    /// errors from the notifier are returned as-is; they mean the event stream
    /// is broken.
    pub fn await_quiescence<N: Notifier + ?Sized>(
        &self,
        notifier: &mut N,
        running: &AtomicBool,
    ) -> Result<Quiescence> {
        info!("Waiting for filesystem change...");

        let mut state = SettleState::new(&self.config);
        let mut events = 0;

        loop {
            if !running.load(Ordering::SeqCst) {
                return Ok(Quiescence::Interrupted);
            }

            let batch = notifier.read(Some(state.current_timeout()))?;
            if state.is_quiescent(batch.len()) {
                debug!("Changes have settled");
                return Ok(Quiescence::Settled { events });
            }

            for event in &batch {
                debug!("Changed: {} ({})", event.display_name(), event.kinds);
                debug!("Waiting for changes to settle...");
            }

            events += batch.len();
            state.observe(batch.len());
        }
    }
}
