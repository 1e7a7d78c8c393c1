//! Error types for configuration and sync passes

use std::path::PathBuf;
use thiserror::Error;

/// Invalid startup configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settle period is negative, NaN or infinite
    #[error("invalid settle period {0}: must be a finite number of seconds >= 0")]
    InvalidSettle(f64),
}

/// A mirroring pass that did not complete successfully
///
/// Never fatal: the caller logs it and retries after the next quiescence.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The mirroring tool could not be started at all
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The mirroring tool exited unsuccessfully
    #[error("{}", describe_failure(.code))]
    Failed { code: Option<i32> },
}

fn describe_failure(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("sync exited with status {}", code),
        None => "sync was terminated by a signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display_with_code() {
        let err = SyncError::Failed { code: Some(23) };
        assert_eq!(err.to_string(), "sync exited with status 23");
    }

    #[test]
    fn test_failed_display_without_code() {
        let err = SyncError::Failed { code: None };
        assert_eq!(err.to_string(), "sync was terminated by a signal");
    }

    #[test]
    fn test_invalid_settle_display() {
        let err = ConfigError::InvalidSettle(-1.5);
        assert!(err.to_string().contains("-1.5"));
    }
}
