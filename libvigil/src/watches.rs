//! Watch handle bookkeeping.
//!
//! The kernel names each watch with a small positive integer and reuses
//! freed numbers aggressively, so the natural table is a dense vector
//! indexed by handle. A released slot stays allocated as a tombstone
//! until the kernel hands the number out again.

use std::path::{Path, PathBuf};

/// Identifier the kernel assigned to one watch.
///
/// Valid handles are positive; the overflow pseudo-event carries `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle(i32);

impl WatchHandle {
    pub(crate) fn from_raw(wd: i32) -> Self {
        WatchHandle(wd)
    }

    pub fn as_raw(self) -> i32 {
        self.0
    }

    /// Table slot for this handle. Handles start at 1, so slot 0 holds
    /// handle 1. Non-positive handles have no slot.
    fn slot(self) -> Option<usize> {
        (self.0 > 0).then(|| (self.0 - 1) as usize)
    }
}

/// Maps live watch handles to the directory each one observes.
#[derive(Debug, Default)]
pub struct WatchTable {
    slots: Vec<Option<PathBuf>>,
}

impl WatchTable {
    pub fn new() -> Self {
        WatchTable::default()
    }

    /// Binds `handle` to `path`, growing the table as needed. Re-binding
    /// an occupied slot overwrites it: the kernel reusing a handle means
    /// the old watch is gone.
    pub fn register(&mut self, handle: WatchHandle, path: PathBuf) {
        let Some(slot) = handle.slot() else { return };
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(path);
    }

    pub fn lookup(&self, handle: WatchHandle) -> Option<&Path> {
        self.slots.get(handle.slot()?)?.as_deref()
    }

    /// Clears the slot for `handle`, returning the path it held.
    pub fn release(&mut self, handle: WatchHandle) -> Option<PathBuf> {
        let slot = handle.slot()?;
        self.slots.get_mut(slot)?.take()
    }

    /// Rewrites every registered path at or under `old` to live under
    /// `new` instead. Called when a watched directory is renamed, since
    /// the kernel keeps delivering events on the old handles. Returns the
    /// number of entries touched.
    ///
    /// Prefix matching is per path component: `/a/b` is a prefix of
    /// `/a/b/c` but not of `/a/bc`.
    pub fn rewrite_prefix(&mut self, old: &Path, new: &Path) -> usize {
        let mut rewritten = 0;
        for entry in self.slots.iter_mut().flatten() {
            if let Ok(rest) = entry.strip_prefix(old) {
                *entry = if rest.as_os_str().is_empty() {
                    new.to_path_buf()
                } else {
                    new.join(rest)
                };
                rewritten += 1;
            }
        }
        rewritten
    }

    /// Iterates over live `(handle, path)` pairs in slot order.
    pub fn live(&self) -> impl Iterator<Item = (WatchHandle, &Path)> {
        self.slots.iter().enumerate().filter_map(|(slot, path)| {
            path.as_deref()
                .map(|p| (WatchHandle(slot as i32 + 1), p))
        })
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
