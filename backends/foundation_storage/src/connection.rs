//! Connection opening for the storage client.
//!
//! URL handling lives here so that anything standing in for the network
//! (see [`ConnectionOpener`]) still goes through the same parsing rules as
//! the real code path.

use crate::errors::ClientError;
use crate::transport::HttpConnection;

/// A storage URL split into the parts the client needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    url: url::Url,
    proxy: Option<url::Url>,
}

impl ParsedUrl {
    /// Parses `url`, and `proxy` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] when either URL fails to parse,
    /// is not http/https, or has no host.
    pub fn parse(url: &str, proxy: Option<&str>) -> Result<Self, ClientError> {
        let url = Self::parse_http_url(url)?;
        let proxy = proxy.map(Self::parse_http_url).transpose()?;
        Ok(Self { url, proxy })
    }

    fn parse_http_url(raw: &str) -> Result<url::Url, ClientError> {
        let parsed = url::Url::parse(raw)?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ClientError::InvalidUrl(format!(
                    "unsupported scheme {other} in {raw}"
                )))
            }
        }
        if parsed.host_str().is_none() {
            return Err(ClientError::InvalidUrl(format!("missing host in {raw}")));
        }
        Ok(parsed)
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    #[must_use]
    pub fn is_https(&self) -> bool {
        self.url.scheme() == "https"
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.url.port_or_known_default().unwrap_or(80)
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    #[must_use]
    pub fn proxy(&self) -> Option<&url::Url> {
        self.proxy.as_ref()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Joins path segments onto this URL's path, percent-encoding each one.
    #[must_use]
    pub fn join_path(&self, segments: &[&str]) -> String {
        let mut joined = self.url.clone();
        if let Ok(mut path) = joined.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        joined.path().to_string()
    }
}

/// Per-connection options the client passes when opening a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub proxy: Option<String>,
    pub cacert: Option<String>,
    pub insecure: bool,
    pub ssl_compression: bool,
}

impl ConnectionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ssl_compression: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    #[must_use]
    pub fn with_cacert(mut self, cacert: impl Into<String>) -> Self {
        self.cacert = Some(cacert.into());
        self
    }
}

/// Opens a connection for one attempt against `url`.
///
/// The client calls this once per attempt, including every retry.
pub trait ConnectionOpener {
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the URL is invalid or the connection
    /// cannot be established.
    fn open(
        &self,
        url: &str,
        options: &ConnectionOptions,
    ) -> Result<(ParsedUrl, Box<dyn HttpConnection>), ClientError>;
}
