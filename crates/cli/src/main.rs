//! Resync CLI - resync command

use anyhow::Result;
use clap::Parser;
use cli_lib::{logging, shutdown, Orchestrator};
use resync_core::{
    default_exclude_file, parse_settle, RsyncInvoker, SyncConfig, DEFAULT_SETTLE_SECS,
};
use std::path::PathBuf;
use watcher::{DebounceConfig, NotifyNotifier};

/// Resync - mirror a directory tree with rsync once changes settle
#[derive(Parser, Debug)]
#[command(name = "resync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source directory to watch and mirror
    #[arg(value_name = "src")]
    src: PathBuf,

    /// Destination handed to rsync (local path or host:path)
    #[arg(value_name = "dst")]
    dst: PathBuf,

    /// Required period without additional changes being detected before starting sync
    #[arg(long, value_name = "sec", default_value_t = DEFAULT_SETTLE_SECS)]
    settle: f64,

    /// Debug level logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let settle = parse_settle(cli.settle)?;
    let config = SyncConfig::new(cli.src, cli.dst).with_exclude_file(default_exclude_file());

    let invoker = RsyncInvoker::default();
    if !invoker.check_available() {
        tracing::warn!("rsync not found on PATH, every sync pass will fail until it is installed");
    }

    let running = shutdown::install_handler()?;
    let notifier = NotifyNotifier::new()?;

    let mut orchestrator = Orchestrator::new(config, DebounceConfig::new(settle), invoker, running);
    orchestrator.run(notifier)
}
