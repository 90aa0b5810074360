//! Simulated backend latency
//!
//! A [`LatencyProfile`] only computes delays; callers own the random source
//! and the sleeping, so tests can pass a seeded RNG and a paused clock.

use crate::config::LatencyConfig;
use rand::Rng;
use std::time::Duration;

/// Bounds for the thinking delay and the per-chunk pacing delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyProfile {
    thinking_base: Duration,
    thinking_jitter: Duration,
    token_delay_min: Duration,
    token_delay_max: Duration,
}

impl LatencyProfile {
    /// Create a profile
    ///
    /// Thinking delays fall in `[thinking_base, thinking_base + thinking_jitter]`;
    /// pacing delays fall in `[token_delay_min, token_delay_max)`. An empty pacing
    /// range degenerates to a constant `token_delay_min`.
    pub fn new(
        thinking_base: Duration,
        thinking_jitter: Duration,
        token_delay_min: Duration,
        token_delay_max: Duration,
    ) -> Self {
        Self {
            thinking_base,
            thinking_jitter,
            token_delay_min,
            token_delay_max,
        }
    }

    pub fn from_config(config: &LatencyConfig) -> Self {
        Self::new(
            config.thinking_base(),
            config.thinking_jitter(),
            config.token_delay_min(),
            config.token_delay_max(),
        )
    }

    /// No delays at all
    pub fn instant() -> Self {
        Self::new(
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    pub fn thinking_bounds(&self) -> (Duration, Duration) {
        (self.thinking_base, self.thinking_base + self.thinking_jitter)
    }

    pub fn token_delay_bounds(&self) -> (Duration, Duration) {
        (self.token_delay_min, self.token_delay_max)
    }

    /// Delay before the first byte of a response, inclusive on both ends
    pub fn thinking_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_ms = self.thinking_jitter.as_millis() as u64;
        self.thinking_base + Duration::from_millis(rng.random_range(0..=jitter_ms))
    }

    /// Pause after one streamed content chunk, exclusive upper bound
    pub fn token_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.token_delay_max <= self.token_delay_min {
            return self.token_delay_min;
        }
        let span_ms = (self.token_delay_max - self.token_delay_min).as_millis() as u64;
        if span_ms == 0 {
            return self.token_delay_min;
        }
        self.token_delay_min + Duration::from_millis(rng.random_range(0..span_ms))
    }
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self::from_config(&LatencyConfig::default())
    }
}
