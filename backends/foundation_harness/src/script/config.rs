//! Per-script configuration.

use core::fmt;
use core::time::Duration;
use std::sync::Arc;

use serde::Deserialize;

use crate::factory::AttemptArgs;

/// Default pause for each trickled read or send in slow mode.
pub const DEFAULT_SLOW_DELAY: Duration = Duration::from_millis(100);

pub type ContentTypeHook = Arc<dyn Fn(&str) + Send + Sync>;
pub type ConnectHook = Arc<dyn Fn(&AttemptArgs) + Send + Sync>;

/// Which attempts report their container as missing.
///
/// A missing container suppresses the `x-container-timestamp` header; every
/// attempt whose flag is `false` gets one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MissingContainer {
    /// Same flag for every attempt.
    Always(bool),
    /// One flag per attempt; attempts past the end default to `false`.
    PerAttempt(Vec<bool>),
}

impl MissingContainer {
    #[must_use]
    pub fn for_attempt(&self, index: usize) -> bool {
        match self {
            Self::Always(flag) => *flag,
            Self::PerAttempt(flags) => flags.get(index).copied().unwrap_or(false),
        }
    }
}

impl Default for MissingContainer {
    fn default() -> Self {
        Self::PerAttempt(Vec::new())
    }
}

impl From<bool> for MissingContainer {
    fn from(flag: bool) -> Self {
        Self::Always(flag)
    }
}

impl From<Vec<bool>> for MissingContainer {
    fn from(flags: Vec<bool>) -> Self {
        Self::PerAttempt(flags)
    }
}

/// Everything a script can be told besides its statuses.
///
/// Read-only once the script is built; every attempt shares it.
#[derive(Clone, Default)]
pub struct ScriptConfig {
    timestamps: Vec<String>,
    etags: Vec<Option<String>>,
    missing_container: MissingContainer,
    body: String,
    slow: bool,
    slow_delay: Option<Duration>,
    headers: Vec<(String, String)>,
    auth_v1: bool,
    raise_exc: bool,
    give_content_type: Option<ContentTypeHook>,
    give_connect: Option<ConnectHook>,
}

impl ScriptConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - timestamps: `"1"` for every attempt
    /// - etags: none, so attempts report the fixed baseline etag
    /// - `missing_container`: `false` for every attempt
    /// - body: empty
    /// - slow mode, `auth_v1`, `raise_exc`: off
    /// - no header overrides, no hooks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamps, one per attempt. An empty string is a missing timestamp.
    #[must_use]
    pub fn timestamps<I, S>(mut self, timestamps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.timestamps = timestamps.into_iter().map(Into::into).collect();
        self
    }

    /// Etags, one per attempt. An empty string keeps the baseline etag.
    #[must_use]
    pub fn etags<I, S>(mut self, etags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.etags = etags.into_iter().map(|etag| Some(etag.into())).collect();
        self
    }

    /// Etags where some attempts keep the baseline.
    #[must_use]
    pub fn optional_etags(mut self, etags: Vec<Option<String>>) -> Self {
        self.etags = etags;
        self
    }

    #[must_use]
    pub fn missing_container(mut self, missing: impl Into<MissingContainer>) -> Self {
        self.missing_container = missing.into();
        self
    }

    /// Body served by every attempt.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Enables trickling reads and sends.
    #[must_use]
    pub fn slow(mut self) -> Self {
        self.slow = true;
        self
    }

    /// Overrides the pause of each trickled read or send.
    #[must_use]
    pub fn slow_delay(mut self, delay: Duration) -> Self {
        self.slow_delay = Some(delay);
        self
    }

    /// Header override applied after the baseline headers.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds storage-URL and auth-token headers, as a v1 auth endpoint does.
    #[must_use]
    pub fn auth_v1(mut self) -> Self {
        self.auth_v1 = true;
        self
    }

    /// Makes `get_response` fail with a transport error.
    #[must_use]
    pub fn raise_exc(mut self) -> Self {
        self.raise_exc = true;
        self
    }

    /// Called on every attempt with the outgoing content type, or `""`.
    #[must_use]
    pub fn give_content_type(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.give_content_type = Some(Arc::new(hook));
        self
    }

    /// Called on every attempt with the attempt's arguments.
    #[must_use]
    pub fn give_connect(mut self, hook: impl Fn(&AttemptArgs) + Send + Sync + 'static) -> Self {
        self.give_connect = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn get_timestamp(&self, index: usize) -> Option<String> {
        match self.timestamps.get(index) {
            Some(ts) if ts.is_empty() => None,
            Some(ts) => Some(ts.clone()),
            None => Some("1".to_string()),
        }
    }

    #[must_use]
    pub fn get_etag(&self, index: usize) -> Option<String> {
        self.etags
            .get(index)
            .cloned()
            .flatten()
            .filter(|etag| !etag.is_empty())
    }

    #[must_use]
    pub fn get_missing_container(&self) -> &MissingContainer {
        &self.missing_container
    }

    #[must_use]
    pub fn get_body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn is_slow(&self) -> bool {
        self.slow
    }

    #[must_use]
    pub fn get_slow_delay(&self) -> Duration {
        self.slow_delay.unwrap_or(DEFAULT_SLOW_DELAY)
    }

    #[must_use]
    pub fn get_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn is_auth_v1(&self) -> bool {
        self.auth_v1
    }

    #[must_use]
    pub fn should_raise_exc(&self) -> bool {
        self.raise_exc
    }

    #[must_use]
    pub fn get_content_type_hook(&self) -> Option<&ContentTypeHook> {
        self.give_content_type.as_ref()
    }

    #[must_use]
    pub fn get_connect_hook(&self) -> Option<&ConnectHook> {
        self.give_connect.as_ref()
    }
}

impl fmt::Debug for ScriptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptConfig")
            .field("timestamps", &self.timestamps)
            .field("etags", &self.etags)
            .field("missing_container", &self.missing_container)
            .field("body", &self.body)
            .field("slow", &self.slow)
            .field("slow_delay", &self.slow_delay)
            .field("headers", &self.headers)
            .field("auth_v1", &self.auth_v1)
            .field("raise_exc", &self.raise_exc)
            .field("give_content_type", &self.give_content_type.is_some())
            .field("give_connect", &self.give_connect.is_some())
            .finish()
    }
}
