// Failure accounting and inter-cycle pacing.
use std::time::Duration;

use rand::Rng;

use crate::supervisor::state::RuntimeState;

/// Upper bound of the random addition to the base delay, in seconds.
pub const MAX_JITTER_SECS: u64 = 50;

/// True once the consecutive-miss count has reached `threshold`.
pub fn is_exhausted(state: &RuntimeState, threshold: u32) -> bool {
    state.failures >= threshold
}

/// `base_secs` plus a uniform jitter in `[0, MAX_JITTER_SECS]`.
pub fn next_delay<R: Rng + ?Sized>(base_secs: u64, rng: &mut R) -> Duration {
    Duration::from_secs(base_secs.saturating_add(rng.gen_range(0..=MAX_JITTER_SECS)))
}
