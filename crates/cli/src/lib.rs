//! Resync CLI library
//!
//! Wiring between the watch layer and the sync invoker: the orchestrator loop,
//! logging setup and termination-signal handling.

pub mod logging;
pub mod orchestrator;
pub mod shutdown;

pub use orchestrator::{Orchestrator, Phase, RunStats};
