//! Helpers for driving the `resync` binary
//!
//! One-shot invocations go through `ResyncCommand`, which captures output and
//! timing. Long-running invocations go through `RunningResync`, which
//! streams stderr lines so tests can wait for a log line before acting.

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct ResyncCommand {
    binary_path: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl ResyncCommand {
    pub fn new() -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_resync")),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Run from `dir` instead of the test's working directory
    pub fn current_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = self
            .command()
            .output()
            .context("Failed to execute command")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }

    /// Start the command in the background
    pub fn spawn(&self) -> Result<RunningResync> {
        let mut child = self
            .command()
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn command")?;

        let stderr = child.stderr.take().context("stderr not captured")?;
        let (tx, rx) = channel();
        thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(RunningResync {
            child,
            lines: rx,
            seen: Vec::new(),
        })
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

/// A `resync` process running in the background
pub struct RunningResync {
    child: Child,
    lines: Receiver<String>,
    seen: Vec<String>,
}

impl RunningResync {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait until `count` stderr lines in total contain `needle`
    pub fn wait_for_line(&mut self, needle: &str, count: usize, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        while self.seen.iter().filter(|l| l.contains(needle)).count() < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) => self.seen.push(line),
                Err(RecvTimeoutError::Timeout) => anyhow::bail!(
                    "Timed out waiting for {:?} x{}; stderr so far:\n{}",
                    needle,
                    count,
                    self.seen.join("\n")
                ),
                Err(RecvTimeoutError::Disconnected) => anyhow::bail!(
                    "resync exited before logging {:?}; stderr:\n{}",
                    needle,
                    self.seen.join("\n")
                ),
            }
        }

        Ok(())
    }

    /// Wait for the process to exit, returning its exit code
    pub fn wait_exit(&mut self, timeout: Duration) -> Result<Option<i32>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status.code());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("resync did not exit within {:?}", timeout);
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    /// Stderr lines collected so far
    pub fn seen(&self) -> &[String] {
        &self.seen
    }
}

impl Drop for RunningResync {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
