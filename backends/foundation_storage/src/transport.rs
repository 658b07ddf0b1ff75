//! Transport capability set a connection must expose to the storage client.
//!
//! A minimal HTTP transport commonly uses one object for both halves of the
//! exchange: the request is written through it and the response is read
//! back from it. [`HttpConnection`] therefore extends [`HttpResponse`], and
//! [`HttpConnection::get_response`] is allowed to hand back the connection
//! itself.

use crate::errors::{ClientError, TransportError};

/// Ordered list of header name/value pairs.
pub type Headers = Vec<(String, String)>;

/// Case-insensitive lookup over an ordered header list.
#[must_use]
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Inserts or replaces a header, matching names case-insensitively.
pub fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    let value = value.into();
    match headers
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
    {
        Some(entry) => entry.1 = value,
        None => headers.push((name.to_string(), value)),
    }
}

/// Removes a header, matching names case-insensitively.
pub fn remove_header(headers: &mut Headers, name: &str) {
    headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
}

/// The head of an outgoing request: method, path (with query) and headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub headers: Headers,
    pub body_len: Option<usize>,
}

impl RequestHead {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: Headers::new(),
            body_len: None,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    #[must_use]
    pub fn with_body_len(mut self, len: usize) -> Self {
        self.body_len = Some(len);
        set_header(&mut self.headers, "Content-Length", len.to_string());
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Response half of the transport.
pub trait HttpResponse {
    fn status(&self) -> u16;

    fn reason(&self) -> &str;

    fn get_headers(&self) -> Headers;

    /// Case-insensitive single header lookup.
    fn get_header(&self, name: &str) -> Option<String> {
        find_header(&self.get_headers(), name).map(ToString::to_string)
    }

    fn get_header_or(&self, name: &str, default: &str) -> String {
        self.get_header(name).unwrap_or_else(|| default.to_string())
    }

    /// Reads up to `amount` bytes of the body, or all that remains when
    /// `amount` is `None`. An empty result means the body is drained.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the underlying stream fails.
    fn read(&mut self, amount: Option<usize>) -> Result<Vec<u8>, TransportError>;
}

/// Request half of the transport.
pub trait HttpConnection: HttpResponse {
    fn connect(&mut self);

    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// Writes the request head.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request cannot be issued.
    fn request(&mut self, head: &RequestHead) -> Result<(), ClientError>;

    /// Writes a chunk of the request body, returning the bytes accepted.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the write fails.
    fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Waits for the interim response of an `Expect: 100-continue` request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the handshake fails on the wire.
    fn get_expect(&mut self) -> Result<Box<dyn HttpResponse>, TransportError>;

    /// Waits for the final response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response arrives.
    fn get_response(&mut self) -> Result<&mut dyn HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_helpers_are_case_insensitive() {
        let mut headers = Headers::new();
        set_header(&mut headers, "X-Auth-Token", "abc");
        set_header(&mut headers, "x-auth-token", "def");

        assert_eq!(headers.len(), 1);
        assert_eq!(find_header(&headers, "X-AUTH-TOKEN"), Some("def"));

        remove_header(&mut headers, "X-Auth-TOKEN");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_request_head_body_len_sets_content_length() {
        let head = RequestHead::new("PUT", "/v1/a/c/o").with_body_len(12);
        assert_eq!(head.header("content-length"), Some("12"));
        assert_eq!(head.body_len, Some(12));
    }
}
