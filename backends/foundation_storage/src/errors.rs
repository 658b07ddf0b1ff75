use derive_more::From;
use std::io;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Transport level failures.
///
/// These model faults below the HTTP layer: the socket never opened, the
/// request could not be written, or the peer dropped the conversation. A
/// client sees them in place of a status code.
#[derive(From, Debug)]
pub enum TransportError {
    /// Connection could not be established.
    #[from(ignore)]
    ConnectFailed(String),

    /// Request or response exchange failed after connecting.
    #[from(ignore)]
    RequestFailed(String),

    /// I/O error while talking to the peer.
    #[from]
    Io(io::Error),
}

impl std::error::Error for TransportError {}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectFailed(msg) => write!(f, "Connection failed: {msg}"),
            Self::RequestFailed(msg) => write!(f, "Request failed: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

/// Errors surfaced by the storage client.
#[derive(From, Debug)]
pub enum ClientError {
    /// Transport failure, possibly retried by the client.
    #[from]
    Transport(TransportError),

    /// The server answered with an unsuccessful status.
    #[from(ignore)]
    Http { status: u16, reason: String },

    /// TLS certificate was rejected.
    #[from(ignore)]
    Certificate(String),

    /// Authentication exchange failed.
    #[from(ignore)]
    Auth(String),

    /// URL could not be parsed or uses an unsupported scheme.
    #[from(ignore)]
    InvalidUrl(String),

    /// Anything else, never retried.
    #[from(ignore)]
    Other(BoxedError),
}

impl ClientError {
    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a sequential retry may recover from this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl std::error::Error for ClientError {}

impl core::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "Transport error: {err}"),
            Self::Http { status, reason } => write!(f, "HTTP {status} {reason}"),
            Self::Certificate(msg) => write!(f, "Certificate error: {msg}"),
            Self::Auth(msg) => write!(f, "Authentication failed: {msg}"),
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {url}"),
            Self::Other(err) => write!(f, "Storage client error: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// WHY: Retry logic in the client keys off this classification
    /// WHAT: Transport faults and 5xx retry, 4xx and certificate errors do not
    #[test]
    fn test_client_error_retry_classification() {
        assert!(ClientError::from(TransportError::ConnectFailed("x".into())).is_retryable());
        assert!(ClientError::Http {
            status: 503,
            reason: "Unavailable".into()
        }
        .is_retryable());
        assert!(!ClientError::Http {
            status: 404,
            reason: "Not Found".into()
        }
        .is_retryable());
        assert!(!ClientError::Certificate("invalid_certificate".into()).is_retryable());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(err.to_string().contains("I/O error"));
        assert!(ClientError::from(err).to_string().starts_with("Transport error"));
    }
}
