//! Sync invoker
//!
//! Runs one full mirroring pass synchronously. Output of the tool is forwarded
//! to our stdout/stderr; only its exit status is interpreted.

use crate::config::SyncConfig;
use crate::error::SyncError;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Outcome of a successful mirroring pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Exit code of the tool (0 unless the invoker is a fake)
    pub exit_code: Option<i32>,
    /// Wall-clock time the pass took
    pub elapsed: Duration,
}

/// Performs one mirroring pass
///
/// Blocks the caller for the whole transfer. Implementations must not treat a
/// failed pass as fatal; they report it and let the caller retry later.
pub trait SyncInvoker {
    /// Mirror `config.source` into `config.destination`
    fn run_sync(&mut self, config: &SyncConfig) -> Result<SyncReport, SyncError>;
}

/// Sync invoker backed by the external `rsync` binary
#[derive(Debug, Clone)]
pub struct RsyncInvoker {
    program: PathBuf,
}

impl Default for RsyncInvoker {
    fn default() -> Self {
        Self::with_program("rsync")
    }
}

impl RsyncInvoker {
    /// Use a specific binary instead of `rsync` from `PATH`
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check if the configured binary can be executed
    pub fn check_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Build the command line for one pass
    pub fn command(&self, config: &SyncConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(config.switches.args());

        if let Some(exclude_file) = &config.exclude_file {
            cmd.arg("--exclude-from").arg(exclude_file);
        }

        cmd.arg(&config.source)
            .arg(&config.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl SyncInvoker for RsyncInvoker {
    fn run_sync(&mut self, config: &SyncConfig) -> Result<SyncReport, SyncError> {
        tracing::debug!("Running {:?}", self.command(config));

        let start = Instant::now();
        let status = self
            .command(config)
            .status()
            .map_err(|source| SyncError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        let elapsed = start.elapsed();

        if !status.success() {
            return Err(SyncError::Failed {
                code: status.code(),
            });
        }

        Ok(SyncReport {
            exit_code: status.code(),
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args_of(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_command_line_without_excludes() {
        let config = SyncConfig::new("/work/tree/", "build-host:/work/tree");
        let cmd = RsyncInvoker::default().command(&config);

        assert_eq!(cmd.get_program(), OsStr::new("rsync"));
        assert_eq!(
            args_of(&cmd),
            vec![
                "--recursive",
                "--verbose",
                "--progress",
                "--links",
                "--times",
                "--omit-dir-times",
                "/work/tree/",
                "build-host:/work/tree",
            ]
        );
    }

    #[test]
    fn test_command_line_with_excludes() {
        let config = SyncConfig::new("src", "dst")
            .with_exclude_file(Some(PathBuf::from("/opt/resync/resync-exclude.txt")));
        let cmd = RsyncInvoker::default().command(&config);
        let args = args_of(&cmd);

        let pos = args.iter().position(|a| *a == "--exclude-from").unwrap();
        assert_eq!(args[pos + 1], "/opt/resync/resync-exclude.txt");
        // Paths always come last, source before destination
        assert_eq!(&args[args.len() - 2..], &["src", "dst"]);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let mut invoker = RsyncInvoker::with_program("/nonexistent/bin/rsync");
        let err = invoker
            .run_sync(&SyncConfig::new("src", "dst"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Spawn { .. }));
        assert!(!invoker.check_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_exit_status() {
        let mut invoker = RsyncInvoker::with_program("true");
        let report = invoker.run_sync(&SyncConfig::new("src", "dst")).unwrap();
        assert_eq!(report.exit_code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_status() {
        let mut invoker = RsyncInvoker::with_program("false");
        let err = invoker
            .run_sync(&SyncConfig::new("src", "dst"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Failed { code: Some(1) }));
    }
}
