//! Connection wrapper for integration-style tests.
//!
//! [`ConnectionWrapper`] stands in for the client's connection opener. URL
//! parsing still goes through [`ParsedUrl::parse`], so scheme, host and path
//! handling are the real thing, but every connection handed back is a
//! scripted [`FakeConnection`]. Along the way it checks what the client
//! actually sent.
//!
//! Expectation mismatches panic: they are test failures and must never be
//! mistaken for a retryable error by the client under test.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use foundation_storage::{
    ClientError, ConnectionOpener, ConnectionOptions, Headers, HttpConnection, HttpResponse,
    ParsedUrl, RequestHead, TransportError,
};

use crate::attempt::FakeConnection;
use crate::factory::{AttemptArgs, ConnectionFactory};
use crate::script::ScriptConfig;

pub type ForcedError = Arc<dyn Fn() -> ClientError + Send + Sync>;
pub type ReadOverride =
    Arc<dyn Fn(Option<usize>) -> Result<Vec<u8>, TransportError> + Send + Sync>;

/// Path suffix that triggers a certificate failure on secure connections.
pub const INVALID_CERT_SUFFIX: &str = "invalid_cert";

#[derive(Clone, Default)]
struct RequestExpectations {
    auth_token: Option<String>,
    query_string: Option<String>,
    forced_error: Option<ForcedError>,
    return_read: Option<ReadOverride>,
}

pub struct ConnectionWrapper {
    factory: ConnectionFactory,
    storage_url: Option<String>,
    expectations: Arc<RequestExpectations>,
    read_flags: Mutex<Vec<Arc<AtomicBool>>>,
}

impl ConnectionWrapper {
    #[must_use]
    pub fn new<I>(statuses: I, config: ScriptConfig) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        Self::from_factory(ConnectionFactory::new(statuses, config))
    }

    #[must_use]
    pub fn from_factory(factory: ConnectionFactory) -> Self {
        Self {
            factory,
            storage_url: None,
            expectations: Arc::new(RequestExpectations::default()),
            read_flags: Mutex::new(Vec::new()),
        }
    }

    /// Every opened URL must equal `url`.
    #[must_use]
    pub fn expect_storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = Some(url.into());
        self
    }

    /// Every request must carry `X-Auth-Token: token`.
    #[must_use]
    pub fn expect_auth_token(mut self, token: impl Into<String>) -> Self {
        self.expectations_mut().auth_token = Some(token.into());
        self
    }

    /// Every request path must end with `?query`.
    #[must_use]
    pub fn expect_query_string(mut self, query: impl Into<String>) -> Self {
        self.expectations_mut().query_string = Some(query.into());
        self
    }

    /// Every `request()` fails with a fresh error from `make_error`.
    #[must_use]
    pub fn fail_requests_with(
        mut self,
        make_error: impl Fn() -> ClientError + Send + Sync + 'static,
    ) -> Self {
        self.expectations_mut().forced_error = Some(Arc::new(make_error));
        self
    }

    /// Replaces the body reader of every connection. Reads served this way
    /// are not recorded by [`Self::has_been_read`].
    #[must_use]
    pub fn return_read(
        mut self,
        read: impl Fn(Option<usize>) -> Result<Vec<u8>, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.expectations_mut().return_read = Some(Arc::new(read));
        self
    }

    #[must_use]
    pub fn factory(&self) -> &ConnectionFactory {
        &self.factory
    }

    #[must_use]
    pub fn connections_opened(&self) -> usize {
        self.lock_flags().len()
    }

    /// Whether the most recently opened connection had its body read.
    #[must_use]
    pub fn has_been_read(&self) -> bool {
        self.lock_flags()
            .last()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Read flag of every opened connection, in open order.
    #[must_use]
    pub fn read_history(&self) -> Vec<bool> {
        self.lock_flags()
            .iter()
            .map(|flag| flag.load(Ordering::SeqCst))
            .collect()
    }

    fn expectations_mut(&mut self) -> &mut RequestExpectations {
        Arc::make_mut(&mut self.expectations)
    }

    fn lock_flags(&self) -> std::sync::MutexGuard<'_, Vec<Arc<AtomicBool>>> {
        self.read_flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionOpener for ConnectionWrapper {
    fn open(
        &self,
        url: &str,
        options: &ConnectionOptions,
    ) -> Result<(ParsedUrl, Box<dyn HttpConnection>), ClientError> {
        if let Some(expected) = &self.storage_url {
            assert_eq!(expected, url, "client opened an unexpected storage URL");
        }

        let parsed = ParsedUrl::parse(url, options.proxy.as_deref())?;
        let args = AttemptArgs::new().with_address(parsed.host(), parsed.port());
        let inner = self.factory.connect(&args)?;

        let has_been_read = Arc::new(AtomicBool::new(false));
        self.lock_flags().push(Arc::clone(&has_been_read));

        let conn: Box<dyn HttpConnection> = Box::new(WrappedConnection {
            inner,
            expectations: Arc::clone(&self.expectations),
            insecure: options.insecure,
            has_been_read,
        });

        tracing::debug!("wrapped connection opened for {url}");
        Ok((parsed, conn))
    }
}

/// A [`FakeConnection`] that validates requests and records body reads.
pub struct WrappedConnection {
    inner: FakeConnection,
    expectations: Arc<RequestExpectations>,
    insecure: bool,
    has_been_read: Arc<AtomicBool>,
}

impl WrappedConnection {
    #[must_use]
    pub fn inner(&self) -> &FakeConnection {
        &self.inner
    }

    #[must_use]
    pub fn has_been_read(&self) -> bool {
        self.has_been_read.load(Ordering::SeqCst)
    }
}

impl HttpResponse for WrappedConnection {
    fn status(&self) -> u16 {
        self.inner.status()
    }

    fn reason(&self) -> &str {
        self.inner.reason()
    }

    fn get_headers(&self) -> Headers {
        self.inner.get_headers()
    }

    fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, TransportError> {
        if let Some(read) = &self.expectations.return_read {
            return read(amount);
        }
        self.has_been_read.store(true, Ordering::SeqCst);
        self.inner.read(amount)
    }
}

impl HttpConnection for WrappedConnection {
    fn connect(&mut self) {
        self.inner.connect();
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn request(&mut self, head: &RequestHead) -> Result<(), ClientError> {
        if let Some(token) = &self.expectations.auth_token {
            let actual = head.header("X-Auth-Token");
            assert!(
                actual.is_some(),
                "{} {} was sent without an X-Auth-Token header",
                head.method,
                head.path
            );
            assert_eq!(actual, Some(token.as_str()), "unexpected X-Auth-Token");
        }

        if let Some(query) = &self.expectations.query_string {
            assert!(
                head.path.ends_with(&format!("?{query}")),
                "{} does not end with query string ?{query}",
                head.path
            );
        }

        if head.path.ends_with(INVALID_CERT_SUFFIX) && !self.insecure {
            tracing::debug!("rejecting {} with a certificate error", head.path);
            return Err(ClientError::Certificate("invalid_certificate".to_string()));
        }

        if let Some(make_error) = &self.expectations.forced_error {
            return Err(make_error());
        }

        self.inner.request(head)
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.inner.send(data)
    }

    fn get_expect(&mut self) -> Result<Box<dyn HttpResponse>, TransportError> {
        self.inner.get_expect()
    }

    fn get_response(&mut self) -> Result<&mut dyn HttpResponse, TransportError> {
        self.inner.get_response()?;
        Ok(self)
    }
}
