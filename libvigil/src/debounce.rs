//! Keeps a file-event consumer from chasing its own tail.
//!
//! Two independent mechanisms:
//!
//! * [`EchoSuppressor`] answers "is this file different from when we last
//!   acted on it?". A handler that rewrites the file it was invoked for
//!   generates a second wave of events; refreshing the snapshot after the
//!   handler runs makes that wave compare equal and die out.
//! * [`PendingQueue`] holds files that are still being written. A path is
//!   touched on every modification and released only after a quiet period
//!   with no further touches.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::fs;

/// Outcome of an [`EchoSuppressor::check_and_update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The file looks exactly like it did last time; skip it.
    Suppressed,
    /// New file, or changed since the stored snapshot. The snapshot now
    /// reflects the current state.
    NotSuppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Snapshot {
    size: u64,
    mtime: SystemTime,
}

/// Remembers the last observed `(size, mtime)` per path.
#[derive(Debug, Default)]
pub struct EchoSuppressor {
    seen: HashMap<PathBuf, Snapshot>,
}

impl EchoSuppressor {
    pub fn new() -> Self {
        EchoSuppressor::default()
    }

    /// Compares `path` against its stored snapshot and stores the current
    /// state. If the file cannot be inspected, nothing is recorded and
    /// the answer is [`Verdict::NotSuppressed`]: the caller's own
    /// existence check decides what a vanished file means.
    pub fn check_and_update(&mut self, path: &Path) -> Verdict {
        let Ok(info) = fs::stat(path) else {
            return Verdict::NotSuppressed;
        };
        let current = Snapshot {
            size: info.size,
            mtime: info.mtime,
        };
        match self.seen.entry(path.to_path_buf()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == current {
                    Verdict::Suppressed
                } else {
                    entry.insert(current);
                    Verdict::NotSuppressed
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(current);
                Verdict::NotSuppressed
            }
        }
    }

    /// Forgets `path`. Called when the file is deleted or moved away so
    /// a later file under the same name starts fresh.
    pub fn clear(&mut self, path: &Path) {
        self.seen.remove(path);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[derive(Debug)]
struct PendingEntry {
    path: PathBuf,
    touched: Instant,
}

/// Files seen modified but not yet settled, oldest first.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: Vec<PendingEntry>,
}

impl PendingQueue {
    pub fn new() -> Self {
        PendingQueue::default()
    }

    /// Marks `path` as modified now. A path already pending keeps its
    /// queue position but restarts its quiet period.
    pub fn touch(&mut self, path: &Path) {
        let now = Instant::now();
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => entry.touched = now,
            None => self.entries.push(PendingEntry {
                path: path.to_path_buf(),
                touched: now,
            }),
        }
    }

    /// Removes and returns the first entry that has been quiet for at
    /// least `quiet`. Call repeatedly to drain everything due.
    pub fn pop_expired(&mut self, quiet: Duration) -> Option<PathBuf> {
        let pos = self.entries.iter().position(|e| e.touched.elapsed() >= quiet)?;
        Some(self.entries.remove(pos).path)
    }

    /// Drops `path` from the queue, normally because it was handled
    /// through some other trigger or no longer exists.
    pub fn remove(&mut self, path: &Path) {
        self.entries.retain(|e| e.path != path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
