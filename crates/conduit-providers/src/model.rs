use crate::tier::Tier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_PROBE_COOLDOWN: Duration = Duration::from_secs(30);

/// `{name, provider_id, context_window, cost_per_token, capabilities, tier,
/// availability}` from spec §3. Loaded at startup, re-probed on provider
/// error — `availability` is the only mutable field, updated under its own
/// short critical section. A model marked unavailable is excluded from
/// selection only until `probe_cooldown` elapses, then `is_available`
/// admits one more attempt at it, the same `Open -> HalfOpen` cooldown
/// shape `conduit_bus::CircuitBreaker` uses, so a single transient failure
/// never excludes a model for the lifetime of the process.
pub struct ModelDescriptor {
    pub name: String,
    pub provider_id: String,
    pub context_window: usize,
    pub cost_per_token: f64,
    pub capabilities: Vec<&'static str>,
    pub tier: Tier,
    available: AtomicBool,
    unavailable_since: Mutex<Option<Instant>>,
    probe_cooldown: Duration,
}

impl ModelDescriptor {
    pub fn new(
        name: impl Into<String>,
        provider_id: impl Into<String>,
        context_window: usize,
        cost_per_token: f64,
        capabilities: Vec<&'static str>,
        tier: Tier,
    ) -> Self {
        Self {
            name: name.into(),
            provider_id: provider_id.into(),
            context_window,
            cost_per_token,
            capabilities,
            tier,
            available: AtomicBool::new(true),
            unavailable_since: Mutex::new(None),
            probe_cooldown: DEFAULT_PROBE_COOLDOWN,
        }
    }

    pub fn with_probe_cooldown(mut self, cooldown: Duration) -> Self {
        self.probe_cooldown = cooldown;
        self
    }

    /// True if the model hasn't failed, or if its cooldown has elapsed
    /// since the last failure and it's due for a re-probe.
    pub fn is_available(&self) -> bool {
        if self.available.load(Ordering::Acquire) {
            return true;
        }
        let since = self.unavailable_since.lock().expect("descriptor lock poisoned");
        since.map(|t| t.elapsed() >= self.probe_cooldown).unwrap_or(true)
    }

    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::Release);
        *self.unavailable_since.lock().expect("descriptor lock poisoned") = Some(Instant::now());
    }

    pub fn mark_available(&self) {
        self.available.store(true, Ordering::Release);
        *self.unavailable_since.lock().expect("descriptor lock poisoned") = None;
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(&capability)
    }
}
