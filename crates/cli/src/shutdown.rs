//! Termination signal handling

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Install a SIGINT/SIGTERM/SIGHUP handler
///
/// Returns the shared `running` flag; the handler clears it and the
/// orchestrator notices at its next poll, releasing watches before exit.
pub fn install_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    ctrlc::set_handler(move || {
        if flag.swap(false, Ordering::SeqCst) {
            tracing::info!("Termination requested, shutting down...");
        }
    })
    .context("Failed to install termination signal handler")?;

    Ok(running)
}
