//! Logging setup

use tracing::Level;

/// Install the global subscriber
///
/// Log lines go to stderr as `LEVEL message`, leaving stdout to the output
/// forwarded from rsync.
pub fn init(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
