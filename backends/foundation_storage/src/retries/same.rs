use std::time;

use super::{RetryDecider, RetryState, DEFAULT_MIN_DURATION};

/// Waits the same duration before every retry.
#[derive(Clone, Debug)]
pub struct SameBackoffDecider(time::Duration);

impl Default for SameBackoffDecider {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DURATION)
    }
}

impl SameBackoffDecider {
    pub fn new(duration: impl Into<time::Duration>) -> Self {
        Self(duration.into())
    }

    /// Retries immediately, handy when the transport is scripted.
    #[must_use]
    pub fn immediate() -> Self {
        Self(time::Duration::ZERO)
    }
}

impl RetryDecider for SameBackoffDecider {
    fn decide(&self, state: RetryState) -> Option<RetryState> {
        if state.is_exhausted() {
            return None;
        }

        Some(RetryState {
            wait: Some(self.0),
            attempt: state.attempt.saturating_add(1),
            total_allowed: state.total_allowed,
        })
    }
}
