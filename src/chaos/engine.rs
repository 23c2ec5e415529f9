//! Chaos decision engine
//!
//! Pure decision functions layered over a [`RandomSource`]. None of them
//! block beyond the source's lock or fail; each consumes exactly one draw.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::source::{RandomSource, SeededSource};

/// Probability checks and ranged sampling over a shared randomness source
#[derive(Clone)]
pub struct ChaosEngine {
    source: Arc<dyn RandomSource>,
}

impl fmt::Debug for ChaosEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChaosEngine").finish_non_exhaustive()
    }
}

impl ChaosEngine {
    /// Create an engine drawing from `source`
    #[must_use]
    pub fn new(source: Arc<dyn RandomSource>) -> Self {
        Self { source }
    }

    /// Create an engine over a freshly seeded PRNG
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(Arc::new(SeededSource::new(seed)))
    }

    /// True with likelihood `percent / 100`
    ///
    /// `0` never fires and `100` always fires, since the draw is reduced into
    /// `0..100` before the comparison.
    pub fn percent_chance(&self, percent: u8) -> bool {
        self.source.next_non_negative_i32() % 100 < i32::from(percent)
    }

    /// Value in `[low, low + width - 1]`
    ///
    /// `width` is a span, not an upper bound. A width below 1 is treated as 1,
    /// which pins the result to `low`.
    pub fn ranged_i32(&self, low: i32, width: i32) -> i32 {
        let width = width.max(1);
        low.saturating_add(self.source.next_non_negative_i32() % width)
    }

    /// Sample the per-query jitter in milliseconds
    ///
    /// `max_jitter_ms` is passed straight through as the sampling width, so the
    /// result lies in `[min_jitter_ms, min_jitter_ms + max_jitter_ms - 1]`.
    /// With a minimum of 1 that is `[1, max_jitter_ms]`; with any larger
    /// minimum the ceiling moves past `max_jitter_ms`.
    pub fn sample_jitter_ms(&self, min_jitter_ms: i32, max_jitter_ms: i32) -> i32 {
        self.ranged_i32(min_jitter_ms, max_jitter_ms)
    }

    /// [`sample_jitter_ms`](Self::sample_jitter_ms) as a sleepable duration
    pub fn sample_jitter(&self, min_jitter_ms: i32, max_jitter_ms: i32) -> Duration {
        let ms = self.sample_jitter_ms(min_jitter_ms, max_jitter_ms);
        Duration::from_millis(u64::try_from(ms).unwrap_or(0))
    }
}
