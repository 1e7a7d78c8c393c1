//! Change-kind vocabulary and subscription masks

use std::fmt;
use std::ops::BitOr;

/// One kind of directory change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File content modified
    Modified,
    /// Entry created
    Created,
    /// Entry moved into the directory
    MovedIn,
    /// Entry moved out of the directory
    MovedOut,
    /// File opened for writing was closed
    WriteClosed,
    /// The watched directory itself was moved
    SelfMoved,
    /// Entry deleted
    Removed,
    /// The watched directory itself was deleted
    SelfRemoved,
    /// The notification queue overflowed and events were lost
    Overflow,
}

impl ChangeKind {
    /// Every kind, in display order
    pub const ALL: [ChangeKind; 9] = [
        ChangeKind::Modified,
        ChangeKind::Created,
        ChangeKind::MovedIn,
        ChangeKind::MovedOut,
        ChangeKind::WriteClosed,
        ChangeKind::SelfMoved,
        ChangeKind::Removed,
        ChangeKind::SelfRemoved,
        ChangeKind::Overflow,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }

    /// Lower-case inotify-style name
    pub fn name(self) -> &'static str {
        match self {
            ChangeKind::Modified => "modify",
            ChangeKind::Created => "create",
            ChangeKind::MovedIn => "moved_to",
            ChangeKind::MovedOut => "moved_from",
            ChangeKind::WriteClosed => "close_write",
            ChangeKind::SelfMoved => "move_self",
            ChangeKind::Removed => "delete",
            ChangeKind::SelfRemoved => "delete_self",
            ChangeKind::Overflow => "q_overflow",
        }
    }
}

/// Immutable set of change kinds
///
/// Used both as a subscription mask and as the kinds carried by an event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeMask(u16);

impl ChangeMask {
    /// No kinds
    pub const EMPTY: ChangeMask = ChangeMask(0);

    /// Kinds that make a re-sync worthwhile
    ///
    /// Deletions are left out: nothing is ever removed at the destination,
    /// so a local delete has nothing to propagate.
    pub const SYNC_TRIGGERS: ChangeMask = ChangeMask(
        ChangeKind::Modified.bit()
            | ChangeKind::WriteClosed.bit()
            | ChangeKind::Created.bit()
            | ChangeKind::MovedIn.bit()
            | ChangeKind::MovedOut.bit()
            | ChangeKind::SelfMoved.bit(),
    );

    /// Mask holding a single kind
    pub const fn of(kind: ChangeKind) -> Self {
        ChangeMask(kind.bit())
    }

    pub fn contains(self, kind: ChangeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn intersects(self, other: ChangeMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(self, other: ChangeMask) -> ChangeMask {
        ChangeMask(self.0 & other.0)
    }

    pub fn union(self, other: ChangeMask) -> ChangeMask {
        ChangeMask(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Kinds in this set, in display order
    pub fn iter(self) -> impl Iterator<Item = ChangeKind> {
        ChangeKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl From<ChangeKind> for ChangeMask {
    fn from(kind: ChangeKind) -> Self {
        ChangeMask::of(kind)
    }
}

impl BitOr for ChangeMask {
    type Output = ChangeMask;

    fn bitor(self, rhs: ChangeMask) -> ChangeMask {
        self.union(rhs)
    }
}

impl BitOr<ChangeKind> for ChangeMask {
    type Output = ChangeMask;

    fn bitor(self, rhs: ChangeKind) -> ChangeMask {
        self.union(rhs.into())
    }
}

impl BitOr for ChangeKind {
    type Output = ChangeMask;

    fn bitor(self, rhs: ChangeKind) -> ChangeMask {
        ChangeMask::of(self) | rhs
    }
}

impl FromIterator<ChangeKind> for ChangeMask {
    fn from_iter<I: IntoIterator<Item = ChangeKind>>(iter: I) -> Self {
        iter.into_iter().fold(ChangeMask::EMPTY, |mask, kind| mask | kind)
    }
}

impl fmt::Display for ChangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for kind in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(kind.name())?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for ChangeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeMask({})", self)
    }
}
