//! Connection scripts: the ordered outcomes a fake transport replays.

mod config;
mod file;

pub use config::*;
pub use file::ScriptFile;

use std::collections::VecDeque;

/// Fails the attempt at connect time, before any connection exists.
pub const CONNECT_FAILURE: i32 = -1;

/// During the expect phase: the handshake fails with a transport error.
pub const EXPECT_FAILURE: i32 = -2;

/// During the expect phase: the server answers 507 instead of 100.
pub const EXPECT_INSUFFICIENT_STORAGE: i32 = -3;

/// The scripted result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// A positive status code, or a non-positive sentinel meaning the
    /// attempt fails at the transport level.
    pub status: i32,
    pub etag: Option<String>,
    pub body: String,
    /// `None` when the server omits `x-timestamp` for this attempt.
    pub timestamp: Option<String>,
    /// When `false`, the attempt reports an `x-container-timestamp`.
    pub container_missing: bool,
}

impl Outcome {
    #[must_use]
    pub fn new(status: i32) -> Self {
        Self {
            status,
            etag: None,
            body: String::new(),
            timestamp: Some("1".to_string()),
            container_missing: false,
        }
    }

    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Option<String>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_container_missing(mut self, missing: bool) -> Self {
        self.container_missing = missing;
        self
    }

    /// Non-positive statuses never produce a connection.
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        self.status <= 0
    }
}

/// A finite, ordered plan of outcomes, one per expected attempt.
///
/// Defaults for etag, timestamp and container flag are resolved when the
/// script is built, so consuming it is a plain pop from the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    outcomes: VecDeque<Outcome>,
    scripted: usize,
}

impl Script {
    /// Builds one outcome per status, pairing each with the configuration's
    /// values for that position.
    #[must_use]
    pub fn new<I>(statuses: I, config: &ScriptConfig) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let missing = config.get_missing_container();
        let outcomes = statuses
            .into_iter()
            .enumerate()
            .map(|(index, status)| Outcome {
                status,
                etag: config.get_etag(index),
                body: config.get_body().to_string(),
                timestamp: config.get_timestamp(index),
                container_missing: missing.for_attempt(index),
            })
            .collect();
        Self::from_outcomes(outcomes)
    }

    #[must_use]
    pub fn from_outcomes(outcomes: Vec<Outcome>) -> Self {
        let scripted = outcomes.len();
        Self {
            outcomes: outcomes.into(),
            scripted,
        }
    }

    /// Total number of outcomes the script was built with.
    #[must_use]
    pub fn scripted(&self) -> usize {
        self.scripted
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn issued(&self) -> usize {
        self.scripted - self.outcomes.len()
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.outcomes.is_empty()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Outcome> {
        self.outcomes.front()
    }
}

impl Iterator for Script {
    type Item = Outcome;

    fn next(&mut self) -> Option<Self::Item> {
        self.outcomes.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.outcomes.len(), Some(self.outcomes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_zips_config_positionally() {
        let config = ScriptConfig::new()
            .etags(["a", "b"])
            .timestamps(["1", "2"])
            .body("hello");
        let mut script = Script::new([200, 201], &config);

        assert_eq!(script.scripted(), 2);

        let first = script.next().expect("first outcome");
        assert_eq!(first.status, 200);
        assert_eq!(first.etag.as_deref(), Some("a"));
        assert_eq!(first.timestamp.as_deref(), Some("1"));
        assert_eq!(first.body, "hello");

        let second = script.next().expect("second outcome");
        assert_eq!(second.status, 201);
        assert_eq!(second.etag.as_deref(), Some("b"));
        assert_eq!(second.timestamp.as_deref(), Some("2"));

        assert!(script.is_exhausted());
        assert_eq!(script.issued(), 2);
        assert!(script.next().is_none());
    }

    #[test]
    fn test_script_fills_defaults_for_short_sequences() {
        let config = ScriptConfig::new().etags(["only-first"]);
        let outcomes: Vec<Outcome> = Script::new([200, 500, 200], &config).collect();

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].etag.as_deref(), Some("only-first"));
        for outcome in &outcomes[1..] {
            assert_eq!(outcome.etag, None);
            assert_eq!(outcome.timestamp.as_deref(), Some("1"));
            assert!(!outcome.container_missing);
        }
    }

    #[test]
    fn test_non_positive_statuses_are_transport_failures() {
        assert!(Outcome::new(CONNECT_FAILURE).is_transport_failure());
        assert!(Outcome::new(0).is_transport_failure());
        assert!(!Outcome::new(404).is_transport_failure());
    }
}
