use rand::Rng;
use std::time::Duration;

const BASE_DELAY_MS: u64 = 250;
const CAP_DELAY_MS: u64 = 4_000;

/// Exponential backoff with full jitter, base 250ms, cap 4s, per spec §4.4.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE_DELAY_MS.saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX).max(1));
    let capped = exp.min(CAP_DELAY_MS);
    let jittered = rand::thread_rng().gen_range(0..=capped.max(1));
    Duration::from_millis(jittered)
}
