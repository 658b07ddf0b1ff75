//! Reference object-storage client.
//!
//! Every operation opens a fresh connection per attempt through the
//! configured [`ConnectionOpener`] and retries sequentially on transport
//! faults and 5xx statuses, so anything standing in for the network sees the
//! exact attempt sequence a real client produces.

use std::thread;

use crate::connection::{ConnectionOpener, ConnectionOptions, ParsedUrl};
use crate::errors::ClientError;
use crate::retries::{RetryDecider, RetryState, SameBackoffDecider};
use crate::transport::{Headers, HttpConnection, HttpResponse, RequestHead};

pub const DEFAULT_RETRIES: u32 = 5;
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Storage client generic over how connections are opened and how long it
/// waits between retries.
pub struct StorageClient<O, D = SameBackoffDecider> {
    opener: O,
    decider: D,
    retries: u32,
    options: ConnectionOptions,
}

impl<O: ConnectionOpener> StorageClient<O, SameBackoffDecider> {
    #[must_use]
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            decider: SameBackoffDecider::default(),
            retries: DEFAULT_RETRIES,
            options: ConnectionOptions::new(),
        }
    }
}

impl<O: ConnectionOpener, D: RetryDecider> StorageClient<O, D> {
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_decider<T: RetryDecider>(self, decider: T) -> StorageClient<O, T> {
        StorageClient {
            opener: self.opener,
            decider,
            retries: self.retries,
            options: self.options,
        }
    }

    #[must_use]
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Fetches object metadata.
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries are spent, or the first
    /// non-retryable one.
    pub fn head_object(
        &self,
        url: &str,
        token: &str,
        container: &str,
        object: &str,
    ) -> Result<Headers, ClientError> {
        self.with_retry("HEAD", url, |conn, parsed| {
            let head = RequestHead::new("HEAD", parsed.join_path(&[container, object]))
                .with_header("X-Auth-Token", token);
            conn.request(&head)?;

            let response = conn.get_response()?;
            check_status(response)?;
            Ok(response.get_headers())
        })
    }

    /// Downloads an object, optionally with a query string (without `?`).
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries are spent, or the first
    /// non-retryable one.
    pub fn get_object(
        &self,
        url: &str,
        token: &str,
        container: &str,
        object: &str,
        query: Option<&str>,
    ) -> Result<(Headers, Vec<u8>), ClientError> {
        self.with_retry("GET", url, |conn, parsed| {
            let mut path = parsed.join_path(&[container, object]);
            if let Some(query) = query {
                path.push('?');
                path.push_str(query);
            }

            let head = RequestHead::new("GET", path).with_header("X-Auth-Token", token);
            conn.request(&head)?;

            let response = conn.get_response()?;
            check_status(response)?;

            let mut body = Vec::new();
            loop {
                let chunk = response.read(Some(CHUNK_SIZE))?;
                if chunk.is_empty() {
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok((response.get_headers(), body))
        })
    }

    /// Uploads an object using an `Expect: 100-continue` handshake, returning
    /// the etag the server reported.
    ///
    /// # Errors
    ///
    /// Returns the last [`ClientError`] once retries are spent, or the first
    /// non-retryable one. A rejected handshake surfaces as
    /// [`ClientError::Http`] with the interim status.
    pub fn put_object(
        &self,
        url: &str,
        token: &str,
        container: &str,
        object: &str,
        contents: &[u8],
    ) -> Result<String, ClientError> {
        self.with_retry("PUT", url, |conn, parsed| {
            let head = RequestHead::new("PUT", parsed.join_path(&[container, object]))
                .with_header("X-Auth-Token", token)
                .with_header("Expect", "100-continue")
                .with_body_len(contents.len());
            conn.request(&head)?;

            let expect = conn.get_expect()?;
            if expect.status() != 100 {
                tracing::debug!("PUT rejected before body with {}", expect.status());
                return Err(ClientError::Http {
                    status: expect.status(),
                    reason: expect.reason().to_string(),
                });
            }

            for chunk in contents.chunks(CHUNK_SIZE) {
                conn.send(chunk)?;
            }

            let response = conn.get_response()?;
            check_status(response)?;
            Ok(response
                .get_header("etag")
                .map(|etag| etag.trim_matches('"').to_string())
                .unwrap_or_default())
        })
    }

    fn with_retry<T, F>(&self, method: &str, url: &str, mut operation: F) -> Result<T, ClientError>
    where
        F: FnMut(&mut dyn HttpConnection, &ParsedUrl) -> Result<T, ClientError>,
    {
        let mut state = RetryState::initial(self.retries);
        loop {
            match self.attempt(url, &mut operation) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => match self.decider.decide(state) {
                    Some(next) => {
                        tracing::warn!(
                            "{method} {url} failed on attempt {}: {err}, retrying",
                            next.attempt
                        );
                        if let Some(wait) = next.wait.filter(|wait| !wait.is_zero()) {
                            thread::sleep(wait);
                        }
                        state = next;
                    }
                    None => {
                        tracing::debug!("{method} {url} out of retries: {err}");
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }

    fn attempt<T, F>(&self, url: &str, operation: &mut F) -> Result<T, ClientError>
    where
        F: FnMut(&mut dyn HttpConnection, &ParsedUrl) -> Result<T, ClientError>,
    {
        let (parsed, mut conn) = self.opener.open(url, &self.options)?;
        let result = operation(conn.as_mut(), &parsed);
        conn.close();
        result
    }
}

fn check_status(response: &dyn HttpResponse) -> Result<(), ClientError> {
    let status = response.status();
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(ClientError::Http {
        status,
        reason: response.reason().to_string(),
    })
}
