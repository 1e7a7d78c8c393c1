//! Notification subsystem contract

use crate::event::{ChangeEvent, WatchHandle};
use crate::mask::ChangeMask;
use crate::Result;
use std::path::Path;
use std::time::Duration;

/// Directory-level change notification
///
/// Events that arrive between reads are buffered by the implementation (or
/// the OS beneath it), so nothing is lost while the caller is busy elsewhere,
/// short of the buffer itself overflowing.
pub trait Notifier {
    /// Subscribe to changes of the entries directly inside `dir`
    ///
    /// Subscribing a directory that is already watched returns its existing
    /// handle.
    fn subscribe(&mut self, dir: &Path, mask: ChangeMask) -> Result<WatchHandle>;

    /// Cancel a subscription
    fn unsubscribe(&mut self, handle: WatchHandle) -> Result<()>;

    /// Read pending events
    ///
    /// With `None`, blocks until at least one event is available. With
    /// `Some(timeout)`, returns an empty batch once `timeout` passes without
    /// events. Once an event is available every other pending event is
    /// returned in the same batch.
    fn read(&mut self, timeout: Option<Duration>) -> Result<Vec<ChangeEvent>>;
}
