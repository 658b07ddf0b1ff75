use std::time;

pub const DEFAULT_MIN_DURATION: time::Duration = time::Duration::from_millis(100);

/// Where a request is in its retry budget.
///
/// `attempt` counts retries already granted, so the first try of a request
/// starts at zero and `total_allowed` is the number of retries permitted
/// after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryState {
    pub wait: Option<time::Duration>,
    pub total_allowed: u32,
    pub attempt: u32,
}

impl RetryState {
    #[must_use]
    pub fn new(attempt: u32, total_allowed: u32, wait: Option<time::Duration>) -> Self {
        Self {
            wait,
            total_allowed,
            attempt,
        }
    }

    #[must_use]
    pub fn initial(total_allowed: u32) -> Self {
        Self::new(0, total_allowed, None)
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.total_allowed
    }
}

/// Decides whether another attempt is allowed and how long to wait first.
///
/// Returning `None` ends the retry loop and the last error is surfaced.
pub trait RetryDecider {
    fn decide(&self, state: RetryState) -> Option<RetryState>;
}

impl<T: RetryDecider + ?Sized> RetryDecider for Box<T> {
    fn decide(&self, state: RetryState) -> Option<RetryState> {
        (**self).decide(state)
    }
}
