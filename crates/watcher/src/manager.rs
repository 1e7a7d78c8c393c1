//! Watch manager
//!
//! Establishes one subscription per directory of a source tree and guarantees
//! every subscription is released again, including on error paths.

use crate::error::WatchError;
use crate::event::WatchHandle;
use crate::mask::ChangeMask;
use crate::notifier::Notifier;
use crate::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Active subscriptions, one per directory
///
/// Populated once by a full walk at startup; directories created later are
/// not added.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WatchSet {
    entries: BTreeMap<PathBuf, WatchHandle>,
}

impl WatchSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handle watching `dir`, if any
    pub fn get(&self, dir: &Path) -> Option<WatchHandle> {
        self.entries.get(dir).copied()
    }

    pub fn handles(&self) -> impl Iterator<Item = WatchHandle> + '_ {
        self.entries.values().copied()
    }

    fn insert(&mut self, dir: PathBuf, handle: WatchHandle) {
        self.entries.insert(dir, handle);
    }

    fn drain(&mut self) -> BTreeMap<PathBuf, WatchHandle> {
        std::mem::take(&mut self.entries)
    }
}

/// Outcome of releasing a watch set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Handles released cleanly
    pub released: usize,
    /// Handles whose release failed (each one logged)
    pub failed: usize,
}

/// Owner of a notifier and the watches taken on it
///
/// Dropping the manager releases every watch still held.
pub struct WatchManager<N: Notifier> {
    notifier: N,
    mask: ChangeMask,
    watches: WatchSet,
}

impl<N: Notifier> WatchManager<N> {
    /// Watch every directory under `root`, `root` included
    ///
    /// Symlinked directories are not followed. If any directory cannot be
    /// walked or subscribed to, the watches already taken are released and
    /// the error is returned.
    pub fn establish(notifier: N, root: &Path, mask: ChangeMask) -> Result<Self> {
        if !root.is_dir() {
            return Err(WatchError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        // Early returns below drop `manager`, which releases partial coverage
        let mut manager = Self {
            notifier,
            mask,
            watches: WatchSet::default(),
        };

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|source| WatchError::Walk {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf()),
                source,
            })?;

            if entry.file_type().is_dir() {
                manager.watch_dir(entry.into_path())?;
            }
        }

        Ok(manager)
    }

    fn watch_dir(&mut self, dir: PathBuf) -> Result<()> {
        debug!("Watching: {}", dir.display());
        let handle = self.notifier.subscribe(&dir, self.mask)?;
        self.watches.insert(dir, handle);
        Ok(())
    }

    /// Current watch set
    pub fn watches(&self) -> &WatchSet {
        &self.watches
    }

    /// Mask every watch was registered with
    pub fn mask(&self) -> ChangeMask {
        self.mask
    }

    /// Notifier the watches live on, for reading events
    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Release every watch, best effort
    ///
    /// A failed release is logged and does not stop the remaining ones.
    /// Calling this again after everything is released is a no-op.
    pub fn release(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        for (dir, handle) in self.watches.drain() {
            debug!("Deleting watch: {} ({})", handle, dir.display());
            match self.notifier.unsubscribe(handle) {
                Ok(()) => report.released += 1,
                Err(e) => {
                    warn!("{}", e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}

impl<N: Notifier> Drop for WatchManager<N> {
    fn drop(&mut self) {
        if !self.watches.is_empty() {
            self.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedNotifier;
    use std::fs;
    use tempfile::TempDir;

    /// Tree with directories {a, a/b, a/c} and a few files
    fn sample_tree() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        fs::create_dir_all(a.join("b")).unwrap();
        fs::create_dir_all(a.join("c")).unwrap();
        fs::write(a.join("top.txt"), b"1").unwrap();
        fs::write(a.join("b/inner.txt"), b"2").unwrap();
        (temp_dir, a)
    }

    fn establish(root: &Path) -> Result<WatchManager<ScriptedNotifier>> {
        WatchManager::establish(ScriptedNotifier::new(), root, ChangeMask::SYNC_TRIGGERS)
    }

    #[test]
    fn test_one_watch_per_directory() {
        let (_temp_dir, a) = sample_tree();
        let manager = establish(&a).unwrap();

        let watches = manager.watches();
        assert_eq!(watches.len(), 3);
        assert!(watches.get(&a).is_some());
        assert!(watches.get(&a.join("b")).is_some());
        assert!(watches.get(&a.join("c")).is_some());
        assert!(watches.get(&a.join("top.txt")).is_none());
    }

    #[test]
    fn test_handles_enumerate_every_watch() {
        let (_temp_dir, a) = sample_tree();
        let mut manager = establish(&a).unwrap();
        let released = manager.notifier_mut().released_log();

        let mut handles: Vec<WatchHandle> = manager.watches().handles().collect();
        handles.sort();
        handles.dedup();
        assert_eq!(handles.len(), 3);
        assert!(handles.contains(&manager.watches().get(&a.join("b")).unwrap()));

        // Release works through exactly the enumerated handles
        manager.release();
        let mut released = released.lock().clone();
        released.sort();
        assert_eq!(released, handles);
    }

    #[test]
    fn test_mask_passed_to_every_subscription() {
        let (_temp_dir, a) = sample_tree();
        let mut manager = establish(&a).unwrap();

        assert_eq!(manager.mask(), ChangeMask::SYNC_TRIGGERS);
        let masks = manager.notifier_mut().subscribed_masks();
        assert_eq!(masks.len(), 3);
        assert!(masks.iter().all(|m| *m == ChangeMask::SYNC_TRIGGERS));
    }

    #[test]
    fn test_missing_root_is_setup_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = establish(&missing).err().unwrap();
        assert!(err.is_setup_error());
        assert!(matches!(err, WatchError::NotADirectory { .. }));
    }

    #[test]
    fn test_file_root_is_setup_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();

        let result = establish(&file);
        assert!(matches!(result, Err(WatchError::NotADirectory { .. })));
    }

    #[test]
    fn test_failed_setup_releases_partial_watches() {
        let (_temp_dir, a) = sample_tree();
        let notifier = ScriptedNotifier::new().fail_subscribe_after(2);
        let released = notifier.released_log();

        let err = WatchManager::establish(notifier, &a, ChangeMask::SYNC_TRIGGERS)
            .err()
            .unwrap();
        assert!(err.is_setup_error());
        // The two watches that succeeded were released on the way out
        assert_eq!(released.lock().len(), 2);
    }

    #[test]
    fn test_release_attempts_every_handle() {
        let (_temp_dir, a) = sample_tree();
        let mut manager = establish(&a).unwrap();

        let first = manager.watches().get(&a).unwrap();
        manager.notifier_mut().fail_unsubscribe(first);
        let released = manager.notifier_mut().released_log();

        let report = manager.release();
        assert_eq!(report, ReleaseReport { released: 2, failed: 1 });
        // The failing handle was attempted too
        assert_eq!(released.lock().len(), 3);
        assert!(manager.watches().is_empty());

        // Idempotent
        assert_eq!(manager.release(), ReleaseReport::default());
    }

    #[test]
    fn test_drop_releases_watches() {
        let (_temp_dir, a) = sample_tree();
        let notifier = ScriptedNotifier::new();
        let released = notifier.released_log();

        {
            let _manager =
                WatchManager::establish(notifier, &a, ChangeMask::SYNC_TRIGGERS).unwrap();
        }

        assert_eq!(released.lock().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed() {
        let (temp_dir, a) = sample_tree();
        let outside = temp_dir.path().join("outside");
        fs::create_dir_all(outside.join("deep")).unwrap();
        std::os::unix::fs::symlink(&outside, a.join("link")).unwrap();

        let manager = establish(&a).unwrap();
        assert_eq!(manager.watches().len(), 3);
    }
}
