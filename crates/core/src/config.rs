//! Sync configuration
//!
//! Built once at startup from the command line and never mutated afterwards.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default quiet period before a change burst triggers a sync
pub const DEFAULT_SETTLE_SECS: f64 = 1.0;

/// Exclusion list, looked up next to the running executable
pub const EXCLUDE_FILE_NAME: &str = "resync-exclude.txt";

/// Fixed switches for the mirroring tool
///
/// There is no delete switch: files removed at the source are left alone at
/// the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorSwitches {
    /// Recurse into subdirectories
    pub recursive: bool,
    /// Print each transferred file
    pub verbose: bool,
    /// Print per-file progress
    pub progress: bool,
    /// Copy symlinks as symlinks
    pub links: bool,
    /// Preserve modification times
    pub times: bool,
    /// Leave directory timestamps on the destination untouched
    pub omit_dir_times: bool,
}

impl Default for MirrorSwitches {
    fn default() -> Self {
        Self {
            recursive: true,
            verbose: true,
            progress: true,
            links: true,
            times: true,
            omit_dir_times: true,
        }
    }
}

impl MirrorSwitches {
    /// Render enabled switches as rsync arguments
    pub fn args(&self) -> Vec<&'static str> {
        [
            (self.recursive, "--recursive"),
            (self.verbose, "--verbose"),
            (self.progress, "--progress"),
            (self.links, "--links"),
            (self.times, "--times"),
            (self.omit_dir_times, "--omit-dir-times"),
        ]
        .into_iter()
        .filter_map(|(enabled, arg)| enabled.then_some(arg))
        .collect()
    }
}

/// Everything one mirroring pass needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Source tree, passed to the mirroring tool verbatim
    pub source: PathBuf,
    /// Destination, local path or `host:path`
    pub destination: PathBuf,
    /// Exclusion list handed to `--exclude-from`
    pub exclude_file: Option<PathBuf>,
    /// Mirroring switches
    pub switches: MirrorSwitches,
}

impl SyncConfig {
    /// Create a config with default switches and no exclusion list
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            exclude_file: None,
            switches: MirrorSwitches::default(),
        }
    }

    /// Set the exclusion list file
    pub fn with_exclude_file(mut self, exclude_file: Option<PathBuf>) -> Self {
        self.exclude_file = exclude_file;
        self
    }

    /// Source tree as a path
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Validate a `--settle` value given in seconds
pub fn parse_settle(secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::InvalidSettle(secs));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidSettle(secs))
}

/// Locate the exclusion list co-located with the running executable
///
/// Returns `None` when the executable path is unknown or the file is absent.
pub fn default_exclude_file() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exclude_file_in(exe.parent()?)
}

fn exclude_file_in(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(EXCLUDE_FILE_NAME);
    if candidate.is_file() {
        Some(candidate)
    } else {
        tracing::warn!(
            "Exclusion list not found at {}, syncing without excludes",
            candidate.display()
        );
        None
    }
}
