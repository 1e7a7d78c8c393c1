//! Error types for watch setup, teardown and event reads

use crate::event::WatchHandle;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the watch layer
#[derive(Error, Debug)]
pub enum WatchError {
    /// Notification backend could not be started
    #[error("failed to start file watcher: {0}")]
    Backend(#[source] notify::Error),

    /// Watch root is missing or not a directory
    #[error("cannot watch {path}: not a directory")]
    NotADirectory { path: PathBuf },

    /// Directory walk failed before a subscription could be made
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A directory could not be subscribed to
    #[error("failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Releasing one subscription failed
    #[error("failed to release watch {handle} on {path}: {source}")]
    Release {
        handle: WatchHandle,
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Handle was never issued or was already released
    #[error("unknown watch handle {0}")]
    UnknownHandle(WatchHandle),

    /// The notification backend reported an error
    #[error("notification read failed: {0}")]
    Read(#[source] notify::Error),

    /// The notification backend went away
    #[error("notification channel closed")]
    ChannelClosed,
}

impl WatchError {
    /// True for errors raised while establishing watches
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            WatchError::Backend(_)
                | WatchError::NotADirectory { .. }
                | WatchError::Walk { .. }
                | WatchError::Subscribe { .. }
        )
    }
}
