use std::{cell, time};

use super::{RetryDecider, RetryState, DEFAULT_MIN_DURATION};

const DEFAULT_JITTER: f32 = 0.6;
const DEFAULT_FACTOR: u32 = 2;

/// Doubles (by default) the wait before each retry, with random jitter,
/// clamped to `[min_duration, max_duration]`.
#[derive(Clone, Debug)]
pub struct ExponentialBackoffDecider {
    pub factor: u32,
    pub jitter: f32,
    pub min_duration: time::Duration,
    pub max_duration: time::Duration,
    pub rng: cell::RefCell<fastrand::Rng>,
}

impl Default for ExponentialBackoffDecider {
    fn default() -> Self {
        Self::new(DEFAULT_FACTOR, DEFAULT_JITTER, DEFAULT_MIN_DURATION, None)
    }
}

impl ExponentialBackoffDecider {
    /// # Panics
    ///
    /// Panics when `jitter` is not strictly between 0 and 1.
    pub fn new(
        factor: u32,
        jitter: f32,
        min_duration: time::Duration,
        max_duration: impl Into<Option<time::Duration>>,
    ) -> Self {
        assert!(
            jitter > 0f32 && jitter < 1f32,
            "<exponential-backoff>: jitter must be between 0 and 1."
        );
        Self {
            factor,
            jitter,
            min_duration,
            rng: cell::RefCell::new(fastrand::Rng::new()),
            max_duration: max_duration.into().unwrap_or(time::Duration::MAX),
        }
    }

    /// Seeds the jitter source so waits are reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        *self.rng.borrow_mut() = fastrand::Rng::with_seed(seed);
        self
    }
}

impl RetryDecider for ExponentialBackoffDecider {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn decide(&self, state: RetryState) -> Option<RetryState> {
        if state.is_exhausted() {
            return None;
        }

        let next_attempt = state.attempt.saturating_add(1);
        let base = self
            .min_duration
            .saturating_mul(self.factor.saturating_pow(next_attempt));

        // jitter in whole percent, spread evenly either side of the base
        let spread = (self.jitter * 100f32) as u32;
        let roll = self.rng.borrow_mut().u32(0..=spread * 2);
        let scaled = base.saturating_mul(100 + roll) / (100 + spread);

        Some(RetryState {
            wait: Some(scaled.clamp(self.min_duration, self.max_duration)),
            attempt: next_attempt,
            total_allowed: state.total_allowed,
        })
    }
}
