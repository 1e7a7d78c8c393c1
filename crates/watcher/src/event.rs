//! Change events delivered by a notifier

use crate::mask::{ChangeKind, ChangeMask};
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Opaque token for one active directory subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(u64);

impl WatchHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One raw notification
///
/// Ephemeral: consumed by the change aggregator as soon as it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Subscription that produced the event; `None` only for queue overflow,
    /// which is not tied to any directory
    pub handle: Option<WatchHandle>,
    /// Watched directory the change happened in
    pub dir: PathBuf,
    /// Affected entry inside `dir`, absent when the directory itself changed
    pub name: Option<OsString>,
    /// What happened
    pub kinds: ChangeMask,
}

impl ChangeEvent {
    /// Event about an entry of a watched directory
    pub fn entry(
        handle: WatchHandle,
        dir: impl Into<PathBuf>,
        name: impl Into<OsString>,
        kinds: impl Into<ChangeMask>,
    ) -> Self {
        Self {
            handle: Some(handle),
            dir: dir.into(),
            name: Some(name.into()),
            kinds: kinds.into(),
        }
    }

    /// Events were dropped by the notification layer
    pub fn overflow() -> Self {
        Self {
            handle: None,
            dir: PathBuf::new(),
            name: None,
            kinds: ChangeMask::of(ChangeKind::Overflow),
        }
    }

    pub fn is_overflow(&self) -> bool {
        self.kinds.contains(ChangeKind::Overflow)
    }

    /// Full path of the affected entry
    pub fn path(&self) -> PathBuf {
        match &self.name {
            Some(name) => self.dir.join(name),
            None => self.dir.clone(),
        }
    }

    /// Name for log lines: the entry name, or the directory when there is none
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.dir.display().to_string(),
        }
    }
}
