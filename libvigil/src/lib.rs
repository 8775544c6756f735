//! libvigil – public API surface for the vigil watcher core.
//!
//! Down-stream crates (`cli-bin`, tests, embedders) should depend on the
//! types re-exported here, never on internal modules directly. That
//! gives us room to refactor internals without breaking callers.
//!
//! Two layers are exposed. [`Engine`] is the raw notification engine:
//! recursive watches over directory trees, one path-resolved event per
//! [`Engine::wait`] call. [`Monitor`] sits on top and answers the
//! question consumers actually have, "which files are ready to be acted
//! on", by debouncing the event stream through an echo suppressor and a
//! settle queue.
//!
//! Linux only: the engine speaks inotify natively.

pub mod config;   // env-first runtime knobs
pub mod cookies;  // rename correlation state
pub mod debounce; // echo suppression + settle queue
pub mod engine;   // watch registration and the event stream
pub mod error;    // crate-wide error enum
pub mod events;   // event masks and the kernel record decoder
pub mod fs;       // stat/list helpers
pub mod inotify;  // syscall wrapper
pub mod logging;  // expose the logging init helper
pub mod monitor;  // debounced ready-file view
pub mod watches;  // handle-to-path table

pub use config::Config;
pub use engine::{Engine, Event};
pub use error::{Error, Result};
pub use events::EventMask;
pub use inotify::Timeout;
pub use monitor::{Monitor, MONITOR_MASK};

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod monitor_tests;
