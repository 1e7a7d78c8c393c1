//! In-memory notifier for tests
//!
//! Events are scheduled at offsets from now and delivered by `read` once due,
//! honouring the read timeout in real time. Subscribe and unsubscribe record
//! what they were asked to do and can be told to fail.

use crate::error::WatchError;
use crate::event::{ChangeEvent, WatchHandle};
use crate::mask::ChangeMask;
use crate::notifier::Notifier;
use crate::Result;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Polling granularity while waiting for scheduled events
const TICK: Duration = Duration::from_millis(5);

enum Scheduled {
    Event(ChangeEvent),
    Failure,
}

/// Shared schedule of future events
///
/// Clones feed the same notifier, so a fake sync invoker can inject events
/// while the notifier is owned elsewhere.
#[derive(Clone, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<Vec<(Instant, Scheduled)>>>,
}

impl EventQueue {
    /// Deliver `event` once `delay` has passed
    pub fn push_after(&self, delay: Duration, event: ChangeEvent) {
        self.push(Instant::now() + delay, Scheduled::Event(event));
    }

    /// Deliver `event` on the next read
    pub fn push_now(&self, event: ChangeEvent) {
        self.push_after(Duration::ZERO, event);
    }

    /// Make the read after `delay` fail like a broken notification channel
    pub fn fail_after(&self, delay: Duration) {
        self.push(Instant::now() + delay, Scheduled::Failure);
    }

    /// Entries not yet delivered
    pub fn pending(&self) -> usize {
        self.inner.lock().len()
    }

    fn push(&self, at: Instant, item: Scheduled) {
        let mut inner = self.inner.lock();
        inner.push((at, item));
        inner.sort_by_key(|(at, _)| *at);
    }

    fn take_due(&self, now: Instant) -> Vec<Scheduled> {
        let mut inner = self.inner.lock();
        let split = inner.partition_point(|(at, _)| *at <= now);
        inner.drain(..split).map(|(_, item)| item).collect()
    }

    fn next_due(&self) -> Option<Instant> {
        self.inner.lock().first().map(|(at, _)| *at)
    }
}

/// Scripted `Notifier`
#[derive(Default)]
pub struct ScriptedNotifier {
    queue: EventQueue,
    subscriptions: HashMap<WatchHandle, (PathBuf, ChangeMask)>,
    by_path: HashMap<PathBuf, WatchHandle>,
    next_id: u64,
    fail_subscribe_after: Option<usize>,
    failing_unsubscribes: HashSet<WatchHandle>,
    released: Arc<Mutex<Vec<WatchHandle>>>,
    reads: Arc<Mutex<usize>>,
}

impl ScriptedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `count` subscriptions succeed, then fail every further one
    pub fn fail_subscribe_after(mut self, count: usize) -> Self {
        self.fail_subscribe_after = Some(count);
        self
    }

    /// Make releasing `handle` fail
    pub fn fail_unsubscribe(&mut self, handle: WatchHandle) {
        self.failing_unsubscribes.insert(handle);
    }

    /// Schedule feeding this notifier
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    /// Every handle an unsubscribe was attempted for, failures included
    pub fn released_log(&self) -> Arc<Mutex<Vec<WatchHandle>>> {
        Arc::clone(&self.released)
    }

    /// Number of `read` calls so far
    pub fn read_count(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.reads)
    }

    /// Masks of the live subscriptions
    pub fn subscribed_masks(&self) -> Vec<ChangeMask> {
        self.subscriptions.values().map(|(_, mask)| *mask).collect()
    }
}

impl Notifier for ScriptedNotifier {
    fn subscribe(&mut self, dir: &Path, mask: ChangeMask) -> Result<WatchHandle> {
        if let Some(handle) = self.by_path.get(dir) {
            return Ok(*handle);
        }
        if self.fail_subscribe_after == Some(self.subscriptions.len()) {
            return Err(WatchError::Subscribe {
                path: dir.to_path_buf(),
                source: notify::Error::generic("scripted subscribe failure"),
            });
        }

        self.next_id += 1;
        let handle = WatchHandle::new(self.next_id);
        self.subscriptions.insert(handle, (dir.to_path_buf(), mask));
        self.by_path.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: WatchHandle) -> Result<()> {
        self.released.lock().push(handle);

        let (path, _) = self
            .subscriptions
            .remove(&handle)
            .ok_or(WatchError::UnknownHandle(handle))?;
        self.by_path.remove(&path);

        if self.failing_unsubscribes.contains(&handle) {
            return Err(WatchError::Release {
                handle,
                path,
                source: notify::Error::generic("scripted release failure"),
            });
        }
        Ok(())
    }

    fn read(&mut self, timeout: Option<Duration>) -> Result<Vec<ChangeEvent>> {
        *self.reads.lock() += 1;
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let now = Instant::now();
            let due = self.queue.take_due(now);
            if !due.is_empty() {
                let mut batch = Vec::with_capacity(due.len());
                for item in due {
                    match item {
                        Scheduled::Event(event) => batch.push(event),
                        Scheduled::Failure => {
                            return Err(WatchError::Read(notify::Error::generic(
                                "scripted read failure",
                            )))
                        }
                    }
                }
                return Ok(batch);
            }

            if deadline.is_some_and(|d| now >= d) {
                return Ok(Vec::new());
            }

            let wake = [self.queue.next_due(), deadline]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(now + TICK);
            sleep(wake.saturating_duration_since(now).clamp(Duration::from_millis(1), TICK));
        }
    }
}
