use std::time::Duration;

/// The strictly ordered timeout layers from spec §4.1:
/// `tool_timeout < daemon_timeout < shim_timeout < client_timeout`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutHierarchy {
    pub tool_secs: u64,
    pub daemon_secs: u64,
    pub shim_secs: u64,
    pub client_secs: u64,
}

/// Upper bound rejected at startup regardless of ordering; see spec §4.1.
pub const MAX_TIMEOUT_SECS: u64 = 3600;
/// Below this, a short-timeout warning is logged rather than treated as an error.
pub const SHORT_TIMEOUT_WARN_SECS: u64 = 5;

/// Approximate buffer ratios relative to `tool_timeout`, used only to emit a
/// warning when a layer departs far from the expected shape — never a hard
/// failure, per spec §4.1's "approximately".
const DAEMON_RATIO: f64 = 1.5;
const SHIM_RATIO: f64 = 2.0;
const CLIENT_RATIO: f64 = 2.5;

impl TimeoutHierarchy {
    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }

    pub fn daemon(&self) -> Duration {
        Duration::from_secs(self.daemon_secs)
    }

    pub fn shim(&self) -> Duration {
        Duration::from_secs(self.shim_secs)
    }

    pub fn client(&self) -> Duration {
        Duration::from_secs(self.client_secs)
    }

    /// Ratio of each layer to `tool_secs`, for logging/diagnostics only.
    pub fn ratios(&self) -> (f64, f64, f64) {
        let tool = self.tool_secs.max(1) as f64;
        (
            self.daemon_secs as f64 / tool,
            self.shim_secs as f64 / tool,
            self.client_secs as f64 / tool,
        )
    }

    pub fn expected_ratios() -> (f64, f64, f64) {
        (DAEMON_RATIO, SHIM_RATIO, CLIENT_RATIO)
    }
}
