//! Error type shared by every layer of the crate.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A caller handed us something unusable, e.g. an empty root list.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A system or I/O call failed for a reason we cannot recover from.
    #[error("{op} failed")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Like [`Error::Io`], but tied to a specific path.
    #[error("{op} failed for {}", .path.display())]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// More bytes are queued in the kernel than a well-behaved consumer
    /// should ever see. The channel is still open but events have very
    /// likely been lost already.
    #[error("{pending} bytes pending exceeds the event queue capacity of {limit} bytes")]
    OverCapacity { pending: usize, limit: usize },

    /// A kernel read yielded a buffer that does not decode as a whole
    /// number of event records.
    #[error("truncated event record at offset {offset}: need {needed} bytes, have {available}")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The exclusion pattern did not compile.
    #[error("invalid exclude pattern")]
    BadExclude(#[from] regex::Error),
}

impl Error {
    pub(crate) fn io(op: &'static str, source: io::Error) -> Self {
        Error::Io { op, source }
    }

    pub(crate) fn io_path(op: &'static str, path: &Path, source: io::Error) -> Self {
        Error::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}
