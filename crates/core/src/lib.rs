//! Core types for resync
//!
//! This crate provides:
//! - Immutable sync configuration (paths, mirroring switches, exclusion file)
//! - Settle-duration validation
//! - The sync invoker contract and its rsync implementation

pub mod config;
pub mod error;
pub mod sync;

// Re-exports
pub use config::{
    default_exclude_file, parse_settle, MirrorSwitches, SyncConfig, DEFAULT_SETTLE_SECS,
    EXCLUDE_FILE_NAME,
};
pub use error::{ConfigError, SyncError};
pub use sync::{RsyncInvoker, SyncInvoker, SyncReport};
