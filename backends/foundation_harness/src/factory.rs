//! Connection factory: turns a script into a per-attempt connection opener.

use std::sync::{Arc, Mutex, PoisonError};

use foundation_storage::transport::find_header;
use foundation_storage::{Headers, HttpConnection, RequestHead, TransportError};

use crate::attempt::FakeConnection;
use crate::errors::{HarnessError, HarnessResult};
use crate::script::{Script, ScriptConfig, ScriptFile};

/// What the client handed over when it asked for a connection.
///
/// Hooks registered on the [`ScriptConfig`] receive this on every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub method: Option<String>,
    pub path: Option<String>,
    pub headers: Headers,
}

impl AttemptArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_request(head: &RequestHead) -> Self {
        Self {
            method: Some(head.method.clone()),
            path: Some(head.path.clone()),
            headers: head.headers.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = Some(host.into());
        self.port = Some(port);
        self
    }

    /// Content type of the outgoing request, or `""` when none was sent.
    #[must_use]
    pub fn content_type(&self) -> &str {
        find_header(&self.headers, "Content-Type").unwrap_or("")
    }
}

/// Hands out one [`FakeConnection`] per attempt, each bound to the next
/// scripted outcome.
///
/// Attempts are expected one at a time, in issue order. Asking for more
/// attempts than were scripted fails with [`HarnessError::ScriptExhausted`].
#[derive(Debug)]
pub struct ConnectionFactory {
    script: Mutex<Script>,
    config: Arc<ScriptConfig>,
}

impl ConnectionFactory {
    #[must_use]
    pub fn new<I>(statuses: I, config: ScriptConfig) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let script = Script::new(statuses, &config);
        Self::from_script(script, config)
    }

    #[must_use]
    pub fn from_script(script: Script, config: ScriptConfig) -> Self {
        Self {
            script: Mutex::new(script),
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn from_file(file: ScriptFile) -> Self {
        let (statuses, config) = file.into_parts();
        Self::new(statuses, config)
    }

    #[must_use]
    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    #[must_use]
    pub fn attempts_issued(&self) -> usize {
        self.lock_script().issued()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lock_script().remaining()
    }

    /// Issues the next attempt.
    ///
    /// Hooks run first, then the next outcome is taken. A non-positive status
    /// fails the attempt before any connection exists; otherwise a fresh,
    /// already connected [`FakeConnection`] is returned.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::Transport`] for non-positive scripted statuses
    /// - [`HarnessError::ScriptExhausted`] once every outcome was issued
    pub fn connect(&self, args: &AttemptArgs) -> HarnessResult<FakeConnection> {
        if let Some(hook) = self.config.get_content_type_hook() {
            hook(args.content_type());
        }
        if let Some(hook) = self.config.get_connect_hook() {
            hook(args);
        }

        let (outcome, attempt, scripted) = {
            let mut script = self.lock_script();
            let outcome = script.next();
            (outcome, script.issued(), script.scripted())
        };

        let Some(outcome) = outcome else {
            tracing::warn!("attempt issued after all {scripted} scripted outcomes were used");
            return Err(HarnessError::ScriptExhausted { scripted });
        };

        if outcome.is_transport_failure() {
            tracing::debug!(
                "attempt {attempt}/{scripted} rejected with scripted status {}",
                outcome.status
            );
            return Err(TransportError::ConnectFailed(format!(
                "scripted connection failure (status {})",
                outcome.status
            ))
            .into());
        }

        tracing::debug!(
            "attempt {attempt}/{scripted} connected with status {}",
            outcome.status
        );
        let mut conn = FakeConnection::new(outcome, Arc::clone(&self.config));
        conn.connect();
        Ok(conn)
    }

    /// The factory as a plain callable, for code that takes a connect function.
    pub fn as_fn(&self) -> impl Fn(&AttemptArgs) -> HarnessResult<FakeConnection> + '_ {
        move |args| self.connect(args)
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::DEFAULT_ETAG;
    use crate::script::{CONNECT_FAILURE, EXPECT_FAILURE};
    use foundation_storage::HttpResponse;
    use std::sync::Mutex as StdMutex;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_lock_step_outcomes_then_exhaustion() {
        let factory = ConnectionFactory::new(
            [200, 200],
            ScriptConfig::new().etags(["a", "b"]).timestamps(["1", "2"]),
        );

        let first = factory.connect(&AttemptArgs::new()).expect("first attempt");
        assert!(!first.is_closed());
        assert_eq!(first.get_header("etag").as_deref(), Some("a"));
        assert_eq!(first.get_header("x-timestamp").as_deref(), Some("1"));

        let second = factory.connect(&AttemptArgs::new()).expect("second attempt");
        assert_eq!(second.get_header("etag").as_deref(), Some("b"));
        assert_eq!(second.get_header("x-timestamp").as_deref(), Some("2"));

        assert_eq!(factory.attempts_issued(), 2);
        assert_eq!(factory.remaining(), 0);

        let third = factory.connect(&AttemptArgs::new());
        assert!(matches!(
            third,
            Err(HarnessError::ScriptExhausted { scripted: 2 })
        ));
        assert!(logs_contain("scripted outcomes were used"));
    }

    #[test]
    fn test_builder_and_file_agree_on_empty_etags() {
        let built = ConnectionFactory::new([200], ScriptConfig::new().etags([""]));
        let file = ScriptFile::from_toml_str("statuses = [200]\netags = [\"\"]\n")
            .expect("should parse");
        let loaded = ConnectionFactory::from_file(file);

        let built = built.connect(&AttemptArgs::new()).expect("built attempt");
        let loaded = loaded.connect(&AttemptArgs::new()).expect("loaded attempt");
        assert_eq!(built.get_header("etag").as_deref(), Some(DEFAULT_ETAG));
        assert_eq!(built.get_headers(), loaded.get_headers());
    }

    #[test]
    fn test_non_positive_status_never_builds_a_connection() {
        for status in [CONNECT_FAILURE, EXPECT_FAILURE, 0] {
            let factory = ConnectionFactory::new([status], ScriptConfig::new());
            let call = factory.as_fn();
            assert!(matches!(
                call(&AttemptArgs::new()),
                Err(HarnessError::Transport(TransportError::ConnectFailed(_)))
            ));
        }
    }

    #[test]
    fn test_each_attempt_gets_an_independent_connection() {
        let factory = ConnectionFactory::new([200, 200], ScriptConfig::new().body("abc"));

        let mut first = factory.connect(&AttemptArgs::new()).expect("first");
        assert_eq!(first.read(None).expect("read"), b"abc");
        first.close();

        let mut second = factory.connect(&AttemptArgs::new()).expect("second");
        assert!(!second.is_closed());
        assert_eq!(second.read(None).expect("read"), b"abc");
    }

    #[test]
    fn test_hooks_see_every_attempt() {
        let content_types = Arc::new(StdMutex::new(Vec::<String>::new()));
        let paths = Arc::new(StdMutex::new(Vec::<Option<String>>::new()));

        let seen_types = Arc::clone(&content_types);
        let seen_paths = Arc::clone(&paths);
        let factory = ConnectionFactory::new(
            [200, CONNECT_FAILURE],
            ScriptConfig::new()
                .give_content_type(move |ct| seen_types.lock().unwrap().push(ct.to_string()))
                .give_connect(move |args| seen_paths.lock().unwrap().push(args.path.clone())),
        );

        let head = RequestHead::new("PUT", "/v1/a/c/o").with_header("Content-Type", "text/plain");
        factory
            .connect(&AttemptArgs::from_request(&head))
            .expect("first attempt");
        assert!(factory.connect(&AttemptArgs::new()).is_err());

        assert_eq!(*content_types.lock().unwrap(), vec!["text/plain", ""]);
        assert_eq!(
            *paths.lock().unwrap(),
            vec![Some("/v1/a/c/o".to_string()), None]
        );
    }
}
