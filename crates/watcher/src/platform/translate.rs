//! Translation of `notify` events into per-directory change events

use crate::event::{ChangeEvent, WatchHandle};
use crate::mask::{ChangeKind, ChangeMask};
use dashmap::DashMap;
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One watched directory as seen from the callback thread
#[derive(Debug, Clone, Copy)]
pub(crate) struct Registration {
    pub handle: WatchHandle,
    pub mask: ChangeMask,
}

/// Watched directories, shared between the notifier and the callback thread
pub(crate) type Registry = DashMap<PathBuf, Registration>;

/// Convert one `notify` event into zero or more change events
///
/// Each path is attributed to the watch on its parent directory (entry
/// changes) and, for moves and deletes of a watched directory, to that
/// directory's own watch. Kinds outside a watch's mask are dropped, and so are
/// paths that no watch covers.
pub(crate) fn translate(event: &Event, registry: &Registry) -> Vec<ChangeEvent> {
    if event.need_rescan() {
        return vec![ChangeEvent::overflow()];
    }

    let mut out = Vec::new();
    for (index, path) in event.paths.iter().enumerate() {
        let (entry_kinds, self_kinds) = kinds_for(&event.kind, index);

        if !entry_kinds.is_empty() {
            if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
                attribute(registry, parent, Some(name), entry_kinds, &mut out);
            }
        }
        if !self_kinds.is_empty() {
            attribute(registry, path, None, self_kinds, &mut out);
        }
    }
    out
}

/// Kinds for the entry and for the path itself, by position in the event
fn kinds_for(kind: &EventKind, index: usize) -> (ChangeMask, ChangeMask) {
    let none = ChangeMask::EMPTY;
    match kind {
        EventKind::Create(_) => (ChangeKind::Created.into(), none),
        EventKind::Modify(ModifyKind::Metadata(_)) => (none, none),
        EventKind::Modify(ModifyKind::Name(mode)) => match (mode, index) {
            (RenameMode::From, _) | (RenameMode::Both, 0) => {
                (ChangeKind::MovedOut.into(), ChangeKind::SelfMoved.into())
            }
            (RenameMode::To, _) | (RenameMode::Both, _) => (ChangeKind::MovedIn.into(), none),
            _ => (ChangeKind::MovedIn | ChangeKind::MovedOut, none),
        },
        EventKind::Modify(_) => (ChangeKind::Modified.into(), none),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            (ChangeKind::WriteClosed.into(), none)
        }
        EventKind::Access(_) => (none, none),
        EventKind::Remove(_) => (ChangeKind::Removed.into(), ChangeKind::SelfRemoved.into()),
        // Unclassified events still mean something changed
        EventKind::Any | EventKind::Other => (ChangeKind::Modified.into(), none),
    }
}

fn attribute(
    registry: &Registry,
    dir: &Path,
    name: Option<&OsStr>,
    kinds: ChangeMask,
    out: &mut Vec<ChangeEvent>,
) {
    let Some(registration) = registry.get(dir).map(|r| *r) else {
        return;
    };

    let kinds = kinds.intersection(registration.mask);
    if kinds.is_empty() {
        return;
    }

    out.push(ChangeEvent {
        handle: Some(registration.handle),
        dir: dir.to_path_buf(),
        name: name.map(OsStr::to_os_string),
        kinds,
    });
}
