use std::time::Duration;

use tracing::warn;

/// Default quiet period before a modified file counts as settled.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Environment variable overriding the settle period, in milliseconds.
pub const SETTLE_ENV: &str = "VIGIL_SETTLE_MS";

/// Runtime configuration for the debounced monitor, resolved from
/// environment and defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Quiet period for the pending-modification queue.
    pub settle: Duration,
    /// Ignore zero-size files even when they trigger.
    pub skip_empty: bool,
    /// Track modify events and settle them, as opposed to acting only on
    /// close-write and move-in.
    pub track_modify: bool,
    /// Regular expression matched against bare child names; matches are
    /// invisible to the monitor.
    pub exclude: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            settle: DEFAULT_SETTLE,
            skip_empty: false,
            track_modify: true,
            exclude: None,
        }
    }
}

impl Config {
    /// Environment-first resolution: [`SETTLE_ENV`] overrides the settle
    /// period, everything else keeps its default until the caller fills
    /// it in. Unparsable values are ignored with a warning rather than
    /// failing startup.
    pub fn load() -> Self {
        let mut cfg = Config::default();
        if let Ok(raw) = std::env::var(SETTLE_ENV) {
            match raw.parse::<u64>() {
                Ok(ms) => cfg.settle = Duration::from_millis(ms),
                Err(_) => warn!(value = %raw, "ignoring unparsable {SETTLE_ENV}"),
            }
        }
        cfg
    }
}
