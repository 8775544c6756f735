//! The notification engine: recursive watches plus an ordered event
//! stream.
//!
//! Incoming kernel records and synthesized records share one FIFO queue.
//! Registering a directory does not recurse eagerly; instead it queues a
//! created-directory record per subdirectory found, and processing that
//! record registers the subdirectory in turn. The queue is the traversal
//! worklist, which keeps synthesized and live events in one order and
//! naturally picks up directories created while the walk is in flight.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use regex::bytes::Regex;
use tracing::{debug, trace, warn};

use crate::cookies::RenameCookieTracker;
use crate::error::{Error, Result};
use crate::events::{self, EventMask, RawEvent, RecordIter};
use crate::fs;
use crate::inotify::{Inotify, Timeout};
use crate::watches::WatchTable;

const MAX_QUEUED_EVENTS: &str = "/proc/sys/fs/inotify/max_queued_events";

/// Fallback per-component name limit when `pathconf` reports none.
const DEFAULT_NAME_MAX: usize = 255;

/// One observation, resolved to a full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Affected path. Empty for the queue overflow pseudo-event, which
    /// concerns no path in particular.
    pub path: PathBuf,
    pub mask: EventMask,
    pub cookie: u32,
}

/// Watches a set of directory trees and yields events one at a time.
///
/// Single-threaded by design: every operation runs on the caller's
/// thread and the only blocking point is the readiness wait inside
/// [`Engine::wait`].
#[derive(Debug)]
pub struct Engine {
    channel: Inotify,
    mask: EventMask,
    exclude: Option<Regex>,
    watches: WatchTable,
    queue: VecDeque<RawEvent>,
    cookies: RenameCookieTracker,
    /// Largest per-component name length seen across watched filesystems.
    name_max: usize,
    /// Kernel event queue limit, read once at startup.
    max_queued_events: usize,
}

impl Engine {
    /// Opens an engine watching every tree rooted at `roots`.
    ///
    /// `mask` selects the event kinds to subscribe to; the bits needed
    /// for the engine's own bookkeeping are added on top. `exclude` is an
    /// optional regular expression matched against bare child names;
    /// matching entries and everything below them are invisible.
    ///
    /// Roots that do not exist are skipped. Pre-existing directory
    /// entries are reported through synthesized created events, and
    /// pre-existing files additionally through synthesized close-write
    /// events, so a fresh engine replays the current tree contents before
    /// any live event.
    pub fn open(roots: &[PathBuf], mask: EventMask, exclude: Option<&str>) -> Result<Self> {
        if roots.is_empty() {
            return Err(Error::InvalidArgument("at least one watch root is required"));
        }
        let exclude = exclude.map(Regex::new).transpose()?;
        let max_queued_events = read_max_queued_events()?;
        let channel = Inotify::init()?;

        // Rename tracking and watch teardown only work if the relevant
        // bits are subscribed, whatever the caller asked for.
        let mask = mask
            | EventMask::CREATE
            | EventMask::MOVED_FROM
            | EventMask::MOVED_TO
            | EventMask::DELETE_SELF;

        let mut engine = Engine {
            channel,
            mask,
            exclude,
            watches: WatchTable::new(),
            queue: VecDeque::new(),
            cookies: RenameCookieTracker::new(),
            name_max: DEFAULT_NAME_MAX,
            max_queued_events,
        };
        for root in roots {
            match fs::stat(root) {
                Ok(_) => engine.register_subtree(root)?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(root = %root.display(), "watch root does not exist, skipping");
                }
                Err(e) => return Err(Error::io_path("stat", root, e)),
            }
        }
        debug!(
            watches = engine.watches.live_count(),
            queued = engine.queue.len(),
            "engine open"
        );
        Ok(engine)
    }

    /// Returns the next event, or `None` if `timeout` elapses first.
    ///
    /// Drains the internal queue before asking the kernel for more.
    /// Events whose watch is no longer known are dropped silently, so a
    /// single call may block up to `timeout` even while discarding stale
    /// records.
    pub fn wait(&mut self, timeout: Timeout) -> Result<Option<Event>> {
        loop {
            while let Some(raw) = self.queue.pop_front() {
                if let Some(event) = self.process(raw)? {
                    return Ok(Some(event));
                }
            }
            if !self.channel.wait_readable(timeout)? {
                return Ok(None);
            }
            self.fill_queue()?;
        }
    }

    /// Number of directories currently watched.
    pub fn watch_count(&self) -> usize {
        self.watches.live_count()
    }

    /// Events decoded but not yet returned.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Tears the engine down, dropping queued events and removing every
    /// watch. Equivalent to dropping it; provided for callers that want
    /// the teardown to be visible in the flow of control.
    pub fn close(self) {}

    /// Pulls everything the kernel has pending into the local queue.
    fn fill_queue(&mut self) -> Result<()> {
        let pending = self.channel.pending_bytes()?;
        if pending == 0 {
            return Ok(());
        }
        let limit = self.max_queued_events * (events::HEADER_LEN + self.name_max + 1);
        if pending > limit {
            return Err(Error::OverCapacity { pending, limit });
        }

        let mut buf = vec![0u8; pending];
        let got = self.channel.read_exact_available(&mut buf)?;
        for record in RecordIter::new(&buf[..got]) {
            let raw = record?;
            if let Some(name) = raw.name.as_deref() {
                if self.is_excluded(name) {
                    trace!(name = %name.to_string_lossy(), "excluded");
                    continue;
                }
            }
            self.queue.push_back(raw);
        }
        Ok(())
    }

    /// Resolves one raw record against the watch table and applies its
    /// side effects. Returns `None` for records that resolve to nothing.
    fn process(&mut self, raw: RawEvent) -> Result<Option<Event>> {
        if raw.mask.contains(EventMask::Q_OVERFLOW) {
            warn!("kernel event queue overflowed, events were lost");
            return Ok(Some(Event {
                path: PathBuf::new(),
                mask: raw.mask,
                cookie: raw.cookie,
            }));
        }

        let Some(watch_path) = self.watches.lookup(raw.wd).map(Path::to_path_buf) else {
            // The watch was released earlier in the queue, e.g. events
            // trailing behind an ignore record.
            trace!(wd = raw.wd.as_raw(), "record for unknown watch dropped");
            return Ok(None);
        };
        let path = match raw.name.as_deref() {
            Some(name) => watch_path.join(name),
            None => watch_path.clone(),
        };

        if raw.mask.contains(EventMask::CREATE | EventMask::ISDIR) {
            self.register_subtree(&path)?;
        }
        if raw.mask.contains(EventMask::MOVED_FROM | EventMask::ISDIR) {
            if let Some(name) = raw.name.clone() {
                self.cookies.record(raw.cookie, watch_path, name);
            }
        } else if raw.mask.contains(EventMask::MOVED_TO | EventMask::ISDIR) {
            match self.cookies.take(raw.cookie) {
                Some(rec) => {
                    let old = rec.old_path();
                    let touched = self.watches.rewrite_prefix(&old, &path);
                    debug!(
                        from = %old.display(),
                        to = %path.display(),
                        touched,
                        "watched subtree renamed"
                    );
                    // The directory itself stays watched across the
                    // rename, but re-adding is harmless and covers a
                    // watch lost to an unseen earlier move.
                    if let Some(handle) = self.channel.add_watch(&path, self.mask)? {
                        self.watches.register(handle, path.clone());
                    }
                }
                // No first half on record: the directory came from
                // outside the watched tree and is all new to us.
                None => self.register_subtree(&path)?,
            }
        }
        if raw.mask.contains(EventMask::IGNORED) {
            if let Some(gone) = self.watches.release(raw.wd) {
                trace!(watch = %gone.display(), wd = raw.wd.as_raw(), "watch released");
            }
        }

        Ok(Some(Event {
            path,
            mask: raw.mask,
            cookie: raw.cookie,
        }))
    }

    /// Starts watching `path` and queues synthesized records for what it
    /// already contains. Subdirectory records re-enter here when
    /// processed, so the subtree is covered without eager recursion.
    fn register_subtree(&mut self, path: &Path) -> Result<()> {
        let Some(handle) = self.channel.add_watch(path, self.mask)? else {
            return Ok(());
        };
        self.watches.register(handle, path.to_path_buf());
        self.note_name_max(path);
        trace!(watch = %path.display(), wd = handle.as_raw(), "watch registered");

        let names = match fs::list_dir(path) {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io_path("read_dir", path, e)),
        };
        for name in names {
            if self.is_excluded(&name) {
                continue;
            }
            let child = path.join(&name);
            let info = match fs::stat(&child) {
                Ok(info) => info,
                // Vanished since the listing; its deletion predates the
                // watch, so there is nothing to report.
                Err(_) => continue,
            };
            if info.is_dir {
                self.queue.push_back(RawEvent::synthesized(
                    handle,
                    EventMask::CREATE | EventMask::ISDIR,
                    name,
                ));
            } else {
                self.queue.push_back(RawEvent::synthesized(
                    handle,
                    EventMask::CREATE,
                    name.clone(),
                ));
                self.queue
                    .push_back(RawEvent::synthesized(handle, EventMask::CLOSE_WRITE, name));
            }
        }
        Ok(())
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        match &self.exclude {
            Some(re) => re.is_match(name.as_bytes()),
            None => false,
        }
    }

    /// Folds the name limit of the filesystem holding `path` into the
    /// running maximum. The limit feeds the over-capacity bound, so the
    /// largest value across all watched filesystems is the safe one.
    fn note_name_max(&mut self, path: &Path) {
        let Ok(c_path) = std::ffi::CString::new(path.as_os_str().as_bytes()) else {
            return;
        };
        // SAFETY: c_path outlives the call. A negative return means
        // error or no limit; the current value stands in either case.
        let limit = unsafe { libc::pathconf(c_path.as_ptr(), libc::_PC_NAME_MAX) };
        if limit > 0 {
            self.name_max = self.name_max.max(limit as usize);
        }
    }

    #[cfg(test)]
    pub(crate) fn clamp_queue_capacity(&mut self, max_queued_events: usize) {
        self.max_queued_events = max_queued_events;
    }
}

fn read_max_queued_events() -> Result<usize> {
    let path = Path::new(MAX_QUEUED_EVENTS);
    let text =
        std::fs::read_to_string(path).map_err(|e| Error::io_path("read", path, e))?;
    text.trim()
        .parse()
        .map_err(|_| Error::io_path("parse", path, io::Error::from(io::ErrorKind::InvalidData)))
}
