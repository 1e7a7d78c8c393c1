//! File system watching for resync
//!
//! This crate provides:
//! - One change-notification subscription per directory of a source tree
//! - A `notify`-backed notification subsystem behind the `Notifier` trait
//! - Settle-time debouncing that turns an event burst into one quiescence signal

pub mod debounce;
pub mod error;
pub mod event;
pub mod manager;
pub mod mask;
pub mod notifier;
pub mod platform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-exports
pub use debounce::{ChangeAggregator, DebounceConfig, Quiescence, SettleState};
pub use error::WatchError;
pub use event::{ChangeEvent, WatchHandle};
pub use manager::{ReleaseReport, WatchManager, WatchSet};
pub use mask::{ChangeKind, ChangeMask};
pub use notifier::Notifier;
pub use platform::NotifyNotifier;

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;
