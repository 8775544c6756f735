use std::sync::Mutex;

use lazy_static::lazy_static;

lazy_static! {
    /// Serializes tests that mutate process environment variables, such
    /// as the settle-period override.
    pub static ref ENV_MUTEX: Mutex<()> = Mutex::new(());
}
