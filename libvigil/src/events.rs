//! Event kinds and the decoder for the kernel's wire format.
//!
//! An inotify read yields a packed sequence of variable-length records:
//! a fixed header (`wd`, `mask`, `cookie`, `len`) followed by `len` bytes
//! of NUL-padded child name. [`RecordIter`] walks such a buffer lazily and
//! yields one [`RawEvent`] per record.

use std::ffi::{OsStr, OsString};
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::ptr;

use bitflags::bitflags;

use crate::error::Error;
use crate::watches::WatchHandle;

bitflags! {
    /// Bit mask describing what happened, mirroring the kernel's `IN_*`
    /// constants. The same type serves both as the subscription mask
    /// handed to the kernel and as the description attached to each
    /// delivered event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const ACCESS        = libc::IN_ACCESS;
        const MODIFY        = libc::IN_MODIFY;
        const ATTRIB        = libc::IN_ATTRIB;
        const CLOSE_WRITE   = libc::IN_CLOSE_WRITE;
        const CLOSE_NOWRITE = libc::IN_CLOSE_NOWRITE;
        const OPEN          = libc::IN_OPEN;
        const MOVED_FROM    = libc::IN_MOVED_FROM;
        const MOVED_TO      = libc::IN_MOVED_TO;
        const CREATE        = libc::IN_CREATE;
        const DELETE        = libc::IN_DELETE;
        const DELETE_SELF   = libc::IN_DELETE_SELF;
        const MOVE_SELF     = libc::IN_MOVE_SELF;

        // Set by the kernel only, never requested.
        const UNMOUNT    = libc::IN_UNMOUNT;
        const Q_OVERFLOW = libc::IN_Q_OVERFLOW;
        const IGNORED    = libc::IN_IGNORED;
        const ISDIR      = libc::IN_ISDIR;
    }
}

impl EventMask {
    /// Every kind that can be requested when adding a watch.
    pub const WATCHABLE: EventMask = EventMask::ACCESS
        .union(EventMask::MODIFY)
        .union(EventMask::ATTRIB)
        .union(EventMask::CLOSE_WRITE)
        .union(EventMask::CLOSE_NOWRITE)
        .union(EventMask::OPEN)
        .union(EventMask::MOVED_FROM)
        .union(EventMask::MOVED_TO)
        .union(EventMask::CREATE)
        .union(EventMask::DELETE)
        .union(EventMask::DELETE_SELF)
        .union(EventMask::MOVE_SELF);
}

/// Size of the fixed portion of a kernel event record.
pub(crate) const HEADER_LEN: usize = mem::size_of::<libc::inotify_event>();

/// One decoded kernel record, not yet resolved against the watch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Watch the event was delivered on.
    pub wd: WatchHandle,
    /// What happened.
    pub mask: EventMask,
    /// Correlates the two halves of a rename, zero otherwise.
    pub cookie: u32,
    /// Child name relative to the watched directory, absent for events
    /// about the watched object itself.
    pub name: Option<OsString>,
}

impl RawEvent {
    /// Builds an event that never came from the kernel. Used to seed the
    /// queue with records for pre-existing directory entries.
    pub(crate) fn synthesized(wd: WatchHandle, mask: EventMask, name: OsString) -> Self {
        RawEvent {
            wd,
            mask,
            cookie: 0,
            name: Some(name),
        }
    }
}

/// Lazy decoder over one kernel read buffer.
///
/// Yields `Ok(RawEvent)` per record. A buffer that ends mid-record yields
/// one `Err(TruncatedRecord)` and then fuses: the rest of the buffer
/// cannot be trusted, so nothing after the error is decoded.
pub struct RecordIter<'a> {
    buf: &'a [u8],
    pos: usize,
    poisoned: bool,
}

impl<'a> RecordIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        RecordIter {
            buf,
            pos: 0,
            poisoned: false,
        }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<RawEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned || self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];
        if rest.len() < HEADER_LEN {
            self.poisoned = true;
            return Some(Err(Error::TruncatedRecord {
                offset: self.pos,
                needed: HEADER_LEN,
                available: rest.len(),
            }));
        }

        // The kernel packs records back to back, so the header is not
        // guaranteed to be aligned within our buffer.
        let header: libc::inotify_event =
            unsafe { ptr::read_unaligned(rest.as_ptr() as *const libc::inotify_event) };

        let name_len = header.len as usize;
        let total = HEADER_LEN + name_len;
        if rest.len() < total {
            self.poisoned = true;
            return Some(Err(Error::TruncatedRecord {
                offset: self.pos,
                needed: total,
                available: rest.len(),
            }));
        }

        // `len` counts NUL padding; the real name stops at the first NUL.
        let padded = &rest[HEADER_LEN..total];
        let trimmed = padded.split(|&b| b == 0).next().unwrap_or(&[]);
        let name = if trimmed.is_empty() {
            None
        } else {
            Some(OsStr::from_bytes(trimmed).to_os_string())
        };

        self.pos += total;
        Some(Ok(RawEvent {
            wd: WatchHandle::from_raw(header.wd),
            mask: EventMask::from_bits_retain(header.mask),
            cookie: header.cookie,
            name,
        }))
    }
}
