//! Correlation state for directory renames.
//!
//! A rename inside the watched tree arrives as two events sharing a
//! cookie: moved-from with the old name, moved-to with the new one. The
//! tracker parks the old location until its partner shows up. A rename
//! that leaves the tree never delivers the second half, so the store is
//! bounded and evicts the oldest unmatched entry once full.

use std::collections::{HashMap, VecDeque};
use std::ffi::OsString;
use std::path::PathBuf;

/// Unmatched entries kept before the oldest is dropped.
const CAPACITY: usize = 1024;

/// Where a renamed directory used to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRecord {
    /// Directory the entry was moved out of.
    pub parent: PathBuf,
    /// Name it had there.
    pub name: OsString,
}

impl CookieRecord {
    /// Full old path of the renamed directory.
    pub fn old_path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }
}

#[derive(Debug, Default)]
pub struct RenameCookieTracker {
    records: HashMap<u32, CookieRecord>,
    /// Insertion order for eviction; may hold stale cookies that were
    /// already taken, which eviction skips over.
    order: VecDeque<u32>,
}

impl RenameCookieTracker {
    pub fn new() -> Self {
        RenameCookieTracker::default()
    }

    /// Parks the old location of a rename under `cookie`. Recording a
    /// cookie that is already present replaces the stored location.
    pub fn record(&mut self, cookie: u32, parent: PathBuf, name: OsString) {
        let previous = self.records.insert(cookie, CookieRecord { parent, name });
        if previous.is_none() {
            self.order.push_back(cookie);
            if self.records.len() > CAPACITY {
                self.evict_oldest();
            }
            if self.order.len() > CAPACITY * 2 {
                let records = &self.records;
                self.order.retain(|c| records.contains_key(c));
            }
        }
    }

    /// Removes and returns the record for `cookie`, if any. A second take
    /// of the same cookie returns `None`.
    pub fn take(&mut self, cookie: u32) -> Option<CookieRecord> {
        self.records.remove(&cookie)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn evict_oldest(&mut self) {
        while let Some(oldest) = self.order.pop_front() {
            if self.records.remove(&oldest).is_some() {
                break;
            }
        }
    }
}
