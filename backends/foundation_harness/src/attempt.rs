//! Fake connection for a single attempt.
//!
//! One [`FakeConnection`] plays both halves of an exchange: it is the
//! connection the client writes through and, via
//! [`HttpConnection::get_response`], the response it reads back. A fresh
//! instance is built for every attempt so nothing leaks between retries.

use std::sync::Arc;
use std::thread;

use foundation_storage::transport::{remove_header, set_header};
use foundation_storage::{
    ClientError, Headers, HttpConnection, HttpResponse, RequestHead, TransportError,
};

use crate::script::{Outcome, ScriptConfig, EXPECT_FAILURE, EXPECT_INSUFFICIENT_STORAGE};

/// Etag reported when the outcome does not carry one.
pub const DEFAULT_ETAG: &str = "\"68b329da9893e34099c7d8ad5cb9c940\"";

/// Number of reads and of sends that trickle in slow mode.
pub const SLOW_TRICKLES: usize = 4;

/// Content length reported in slow mode, small enough to force a read loop.
pub const SLOW_CONTENT_LENGTH: &str = "4";

#[derive(Debug)]
pub struct FakeConnection {
    outcome: Outcome,
    config: Arc<ScriptConfig>,
    reason: String,
    host: String,
    port: u16,
    closed: bool,
    cursor: usize,
    slow_reads: usize,
    slow_sends: usize,
    requests: Vec<RequestHead>,
    sent: Vec<u8>,
}

impl FakeConnection {
    /// Builds a closed connection bound to `outcome`.
    #[must_use]
    pub fn new(outcome: Outcome, config: Arc<ScriptConfig>) -> Self {
        Self {
            outcome,
            config,
            reason: "Fake".to_string(),
            host: "1.2.3.4".to_string(),
            port: 1234,
            closed: true,
            cursor: 0,
            slow_reads: 0,
            slow_sends: 0,
            requests: Vec::new(),
            sent: Vec::new(),
        }
    }

    /// Builds a closed connection reporting `status` with the config's body.
    #[must_use]
    pub fn with_status(status: i32, config: Arc<ScriptConfig>) -> Self {
        let outcome = Outcome::new(status).with_body(config.get_body());
        Self::new(outcome, config)
    }

    /// The scripted status, sentinels included.
    #[must_use]
    pub fn raw_status(&self) -> i32 {
        self.outcome.status
    }

    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Request heads written through this connection, in order.
    #[must_use]
    pub fn requests(&self) -> &[RequestHead] {
        &self.requests
    }

    /// Every byte passed to `send`.
    #[must_use]
    pub fn sent_bytes(&self) -> &[u8] {
        &self.sent
    }

    fn trickle(&self, kind: &str, count: usize) {
        let delay = self.config.get_slow_delay();
        tracing::debug!("slow {kind} {count}/{SLOW_TRICKLES}, sleeping {delay:?}");
        thread::sleep(delay);
    }
}

impl HttpResponse for FakeConnection {
    fn status(&self) -> u16 {
        u16::try_from(self.outcome.status).unwrap_or(0)
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn get_headers(&self) -> Headers {
        let timestamp = self.outcome.timestamp.clone().unwrap_or_default();
        let mut headers: Headers = vec![
            ("content-length".into(), self.outcome.body.len().to_string()),
            ("content-type".into(), "x-application/test".into()),
            ("x-timestamp".into(), timestamp.clone()),
            ("last-modified".into(), timestamp),
            ("x-object-meta-test".into(), "testing".into()),
            (
                "etag".into(),
                self.outcome
                    .etag
                    .clone()
                    .filter(|etag| !etag.is_empty())
                    .unwrap_or_else(|| DEFAULT_ETAG.to_string()),
            ),
            ("x-works".into(), "yes".into()),
            ("x-account-container-count".into(), "12345".into()),
        ];

        if self.outcome.timestamp.as_deref().is_none_or(str::is_empty) {
            remove_header(&mut headers, "x-timestamp");
        }

        // the flag reads inverted: a container that is *not* missing reports
        // its timestamp
        if !self.outcome.container_missing {
            set_header(&mut headers, "x-container-timestamp", "1");
        }

        if self.config.is_slow() {
            set_header(&mut headers, "content-length", SLOW_CONTENT_LENGTH);
        }

        for (name, value) in self.config.get_headers() {
            set_header(&mut headers, &name.to_ascii_lowercase(), value.as_str());
        }

        if self.config.is_auth_v1() {
            set_header(&mut headers, "x-storage-url", "storageURL");
            set_header(&mut headers, "x-auth-token", "someauthtoken");
        }

        headers
    }

    fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, TransportError> {
        if self.config.is_slow() && self.slow_reads < SLOW_TRICKLES {
            self.slow_reads += 1;
            self.trickle("read", self.slow_reads);
            return Ok(b" ".to_vec());
        }

        let body = self.outcome.body.as_bytes();
        let remaining = &body[self.cursor..];
        let take = amount.map_or(remaining.len(), |amount| amount.min(remaining.len()));
        self.cursor += take;
        Ok(remaining[..take].to_vec())
    }
}

impl HttpConnection for FakeConnection {
    fn connect(&mut self) {
        self.closed = false;
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn request(&mut self, head: &RequestHead) -> Result<(), ClientError> {
        tracing::debug!("fake request {} {}", head.method, head.path);
        self.requests.push(head.clone());
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.config.is_slow() && self.slow_sends < SLOW_TRICKLES {
            self.slow_sends += 1;
            self.trickle("send", self.slow_sends);
        }
        self.sent.extend_from_slice(data);
        Ok(data.len())
    }

    fn get_expect(&mut self) -> Result<Box<dyn HttpResponse>, TransportError> {
        let status = match self.outcome.status {
            EXPECT_FAILURE => {
                tracing::debug!("expect handshake failing with transport error");
                return Err(TransportError::RequestFailed(
                    "connection lost during expect".to_string(),
                ));
            }
            EXPECT_INSUFFICIENT_STORAGE => 507,
            _ => 100,
        };
        tracing::debug!("expect handshake answered {status}");
        Ok(Box::new(Self::with_status(status, Arc::clone(&self.config))))
    }

    fn get_response(&mut self) -> Result<&mut dyn HttpResponse, TransportError> {
        if self.config.should_raise_exc() {
            return Err(TransportError::RequestFailed("test".to_string()));
        }
        Ok(self)
    }
}
