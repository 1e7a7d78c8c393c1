//! Platform file watching via `notify`
//!
//! Uses the recommended backend for the current OS (inotify on Linux,
//! FSEvents on macOS) with one non-recursive watch per directory.

mod translate;

use crate::error::WatchError;
use crate::event::{ChangeEvent, WatchHandle};
use crate::mask::ChangeMask;
use crate::notifier::Notifier;
use crate::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use dashmap::DashMap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use translate::{translate, Registration, Registry};

/// Notifier backed by the platform's native file watching API
///
/// Raw events are translated on the backend's callback thread and queued
/// until the next `read`.
pub struct NotifyNotifier {
    watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Vec<ChangeEvent>>>,
    registry: Arc<Registry>,
    paths: HashMap<WatchHandle, PathBuf>,
    next_id: u64,
}

impl NotifyNotifier {
    /// Start the platform watcher with no subscriptions
    pub fn new() -> Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let registry: Arc<Registry> = Arc::new(DashMap::new());
        let shared = Arc::clone(&registry);

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let message = match res {
                    Ok(event) => {
                        let batch = translate(&event, &shared);
                        if batch.is_empty() {
                            return;
                        }
                        Ok(batch)
                    }
                    Err(e) => Err(e),
                };
                // Receiver only goes away with the notifier itself
                let _ = tx.send(message);
            },
            Config::default(),
        )
        .map_err(WatchError::Backend)?;

        Ok(Self {
            watcher,
            events: rx,
            registry,
            paths: HashMap::new(),
            next_id: 1,
        })
    }

    /// Number of active subscriptions
    pub fn watch_count(&self) -> usize {
        self.paths.len()
    }
}

/// `dir` resolved against the working directory, with `.` components dropped
///
/// Symlinks are left alone: the backend joins relative paths the same way
/// and never canonicalizes.
fn absolute(dir: &Path) -> Result<PathBuf> {
    let joined = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| WatchError::Subscribe {
                path: dir.to_path_buf(),
                source: notify::Error::io(e),
            })?
            .join(dir)
    };
    Ok(joined.components().collect())
}

impl Notifier for NotifyNotifier {
    fn subscribe(&mut self, dir: &Path, mask: ChangeMask) -> Result<WatchHandle> {
        // The backend reports absolute paths, so that is what events are matched on
        let dir = absolute(dir)?;
        if let Some(existing) = self.registry.get(&dir) {
            return Ok(existing.handle);
        }

        let handle = WatchHandle::new(self.next_id);
        self.next_id += 1;

        // Register first so events racing the watch call are attributed
        self.registry.insert(dir.clone(), Registration { handle, mask });

        if let Err(source) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
            self.registry.remove(&dir);
            return Err(WatchError::Subscribe { path: dir, source });
        }

        self.paths.insert(handle, dir);
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: WatchHandle) -> Result<()> {
        let path = self
            .paths
            .remove(&handle)
            .ok_or(WatchError::UnknownHandle(handle))?;
        self.registry.remove(&path);

        self.watcher
            .unwatch(&path)
            .map_err(|source| WatchError::Release {
                handle,
                path,
                source,
            })
    }

    fn read(&mut self, timeout: Option<Duration>) -> Result<Vec<ChangeEvent>> {
        let first = match timeout {
            None => self.events.recv().map_err(|_| WatchError::ChannelClosed)?,
            Some(timeout) => match self.events.recv_timeout(timeout) {
                Ok(message) => message,
                Err(RecvTimeoutError::Timeout) => return Ok(Vec::new()),
                Err(RecvTimeoutError::Disconnected) => return Err(WatchError::ChannelClosed),
            },
        };

        let mut batch = first.map_err(WatchError::Read)?;
        for message in self.events.try_iter() {
            batch.extend(message.map_err(WatchError::Read)?);
        }
        Ok(batch)
    }
}
