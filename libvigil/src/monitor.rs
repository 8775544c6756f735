//! Policy layer on top of the engine: which events mean "this file is
//! ready to be acted on".
//!
//! A file is ready when it is closed after writing, when it is moved
//! into the tree, or when modifications to it have been quiet for the
//! configured settle period. Ready paths still pass the echo suppressor,
//! so a consumer that rewrites files it is handed does not loop.

use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::debounce::{EchoSuppressor, PendingQueue, Verdict};
use crate::engine::{Engine, Event};
use crate::error::Result;
use crate::events::EventMask;
use crate::fs;
use crate::inotify::Timeout;

/// Event kinds the monitor subscribes to.
pub const MONITOR_MASK: EventMask = EventMask::MODIFY
    .union(EventMask::CLOSE_WRITE)
    .union(EventMask::CLOSE_NOWRITE)
    .union(EventMask::CREATE)
    .union(EventMask::DELETE)
    .union(EventMask::MOVED_FROM)
    .union(EventMask::MOVED_TO)
    .union(EventMask::DELETE_SELF)
    .union(EventMask::MOVE_SELF);

/// Debounced view over one or more watched trees.
pub struct Monitor {
    engine: Engine,
    suppressor: EchoSuppressor,
    pending: PendingQueue,
    config: Config,
}

impl Monitor {
    pub fn new(roots: &[PathBuf], config: Config) -> Result<Self> {
        let engine = Engine::open(roots, MONITOR_MASK, config.exclude.as_deref())?;
        Ok(Monitor {
            engine,
            suppressor: EchoSuppressor::new(),
            pending: PendingQueue::new(),
            config,
        })
    }

    /// Waits up to `timeout` for activity and returns the paths that
    /// became ready, oldest trigger first. An empty vector means nothing
    /// settled this round.
    ///
    /// One call consumes everything the engine can deliver without
    /// blocking again, so a batch of events yields a batch of paths.
    /// Consumers should still call this in a loop with a bounded timeout
    /// in the order of the settle period, otherwise pending
    /// modifications are only flushed when the next live event happens
    /// to arrive.
    pub fn poll(&mut self, timeout: Timeout) -> Result<Vec<PathBuf>> {
        let mut ready = Vec::new();
        if let Some(event) = self.engine.wait(timeout)? {
            self.classify(event, &mut ready);
            while let Some(event) = self.engine.wait(Timeout::Poll)? {
                self.classify(event, &mut ready);
            }
        }
        while let Some(path) = self.pending.pop_expired(self.config.settle) {
            debug!(path = %path.display(), "modifications settled");
            self.consider(path, &mut ready);
        }
        Ok(ready)
    }

    /// Tells the suppressor the consumer just finished with `path`. Any
    /// rewrite the consumer performed becomes the new baseline, so the
    /// events it caused are recognized as echo and dropped.
    pub fn note_handled(&mut self, path: &Path) {
        let _ = self.suppressor.check_and_update(path);
    }

    pub fn watch_count(&self) -> usize {
        self.engine.watch_count()
    }

    /// Paths currently waiting out their settle period.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn classify(&mut self, event: Event, ready: &mut Vec<PathBuf>) {
        let mask = event.mask;
        if mask.contains(EventMask::Q_OVERFLOW) {
            warn!("event overflow, some files may need a manual sweep");
            return;
        }
        if mask.contains(EventMask::ISDIR) {
            // Directory lifecycle is the engine's business; only files
            // become ready.
            return;
        }

        if mask.intersects(EventMask::CLOSE_WRITE | EventMask::MOVED_TO) {
            trace!(path = %event.path.display(), mask = ?mask, "trigger");
            self.consider(event.path, ready);
        } else if mask.contains(EventMask::MODIFY) {
            if self.config.track_modify {
                trace!(path = %event.path.display(), "touched, waiting for quiet");
                self.pending.touch(&event.path);
            }
        } else if mask.intersects(EventMask::DELETE | EventMask::MOVED_FROM) {
            trace!(path = %event.path.display(), "gone, dropping debounce state");
            self.suppressor.clear(&event.path);
            self.pending.remove(&event.path);
        }
    }

    /// Final gate before a path is handed to the consumer.
    fn consider(&mut self, path: PathBuf, ready: &mut Vec<PathBuf>) {
        let info = match fs::stat(&path) {
            Ok(info) => info,
            Err(_) => {
                trace!(path = %path.display(), "vanished before it settled");
                self.pending.remove(&path);
                return;
            }
        };
        if info.is_dir {
            return;
        }
        if self.config.skip_empty && info.size == 0 {
            debug!(path = %path.display(), "empty file skipped");
            return;
        }
        if self.suppressor.check_and_update(&path) == Verdict::Suppressed {
            debug!(path = %path.display(), "echo suppressed");
            self.pending.remove(&path);
            return;
        }
        self.pending.remove(&path);
        // A batch can trigger the same file more than once; the consumer
        // sees it once, at its latest state.
        if !ready.contains(&path) {
            ready.push(path);
        }
    }
}
