//! Thin safe wrapper over the inotify file descriptor.
//!
//! Everything here is a direct syscall translation. Policy, bookkeeping
//! and path resolution live in [`crate::engine`].

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::events::EventMask;
use crate::watches::WatchHandle;

/// How long a wait is allowed to block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Check readiness and return immediately.
    Poll,
    /// Block for at most this long.
    Bounded(Duration),
    /// Block until something arrives.
    Infinite,
}

impl Timeout {
    fn as_poll_ms(self) -> libc::c_int {
        match self {
            Timeout::Poll => 0,
            Timeout::Bounded(d) => d.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            Timeout::Infinite => -1,
        }
    }
}

/// An open inotify channel. Closes the descriptor on drop.
#[derive(Debug)]
pub struct Inotify {
    fd: OwnedFd,
}

impl Inotify {
    pub fn init() -> Result<Self> {
        // SAFETY: plain syscall, no pointers involved.
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(Error::io("inotify_init1", io::Error::last_os_error()));
        }
        // SAFETY: the descriptor is fresh and owned by no one else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Inotify { fd })
    }

    /// Subscribes to `mask` on `path`.
    ///
    /// Returns `Ok(None)` when the path no longer exists. Watch targets
    /// routinely vanish between discovery and registration, and the
    /// kernel would have reported their deletion anyway, so that race is
    /// not an error.
    pub fn add_watch(&self, path: &Path, mask: EventMask) -> Result<Option<WatchHandle>> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Error::InvalidArgument("watch path contains an interior NUL"))?;
        // SAFETY: c_path outlives the call.
        let wd =
            unsafe { libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask.bits()) };
        if wd < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::NotFound {
                return Ok(None);
            }
            return Err(Error::io_path("inotify_add_watch", path, err));
        }
        Ok(Some(WatchHandle::from_raw(wd)))
    }

    /// Drops the subscription behind `handle`. The kernel will still
    /// deliver an ignore record for it.
    pub fn remove_watch(&self, handle: WatchHandle) -> Result<()> {
        // SAFETY: plain syscall.
        let rc = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), handle.as_raw()) };
        if rc < 0 {
            return Err(Error::io("inotify_rm_watch", io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Blocks until the descriptor is readable or `timeout` elapses.
    /// `Ok(true)` means data is waiting. Interrupted waits are retried.
    pub fn wait_readable(&self, timeout: Timeout) -> Result<bool> {
        loop {
            let mut fds = libc::pollfd {
                fd: self.fd.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            // SAFETY: fds is valid for the duration of the call.
            let rc = unsafe { libc::poll(&mut fds, 1, timeout.as_poll_ms()) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(Error::io("poll", err));
            }
            return Ok(rc > 0);
        }
    }

    /// Number of bytes currently queued in the kernel.
    pub fn pending_bytes(&self) -> Result<usize> {
        let mut len: libc::c_int = 0;
        // SAFETY: len is a valid out-pointer for FIONREAD.
        let rc = unsafe { libc::ioctl(self.fd.as_raw_fd(), libc::FIONREAD, &mut len) };
        if rc < 0 {
            return Err(Error::io("ioctl(FIONREAD)", io::Error::last_os_error()));
        }
        Ok(len.max(0) as usize)
    }

    /// Reads until `buf` is full, retrying on interruption. Returns the
    /// bytes read, which only falls short of `buf.len()` if the kernel
    /// stops producing data.
    pub fn read_exact_available(&self, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            // SAFETY: the pointer and length describe the unfilled tail
            // of buf.
            let n = unsafe {
                libc::read(
                    self.fd.as_raw_fd(),
                    buf[total..].as_mut_ptr() as *mut libc::c_void,
                    buf.len() - total,
                )
            };
            if n > 0 {
                total += n as usize;
            } else if n == 0 {
                break;
            } else {
                let err = io::Error::last_os_error();
                match err.kind() {
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => continue,
                    _ => return Err(Error::io("read", err)),
                }
            }
        }
        Ok(total)
    }
}
