//! Keystone-style authentication stub.

use std::collections::BTreeMap;
use std::sync::Arc;

use foundation_storage::{AuthCredentials, AuthRequest, Authenticator, ClientError};

pub const STUB_STORAGE_URL: &str = "http://url/";
pub const STUB_TOKEN: &str = "token";

pub type AuthErrorFactory = Arc<dyn Fn(&str) -> ClientError + Send + Sync>;

/// Fakes a keystone login.
///
/// Succeeds with [`STUB_STORAGE_URL`] / [`STUB_TOKEN`] when the presented
/// `os_options` and required options match, returns `Ok(None)` when they do
/// not, and rejects https auth URLs ending in `invalid-certificate` or
/// `self-signed-certificate` unless the request disables verification.
#[derive(Clone)]
pub struct FakeKeystoneAuth {
    os_options: BTreeMap<String, String>,
    required: BTreeMap<String, String>,
    error: Option<AuthErrorFactory>,
}

impl FakeKeystoneAuth {
    #[must_use]
    pub fn new(os_options: BTreeMap<String, String>) -> Self {
        Self {
            os_options,
            required: BTreeMap::new(),
            error: None,
        }
    }

    /// Any presented option `name` must equal `value`.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.required.insert(name.into(), value.into());
        self
    }

    /// Every login fails with the error `make_error` builds from `"test"`.
    #[must_use]
    pub fn failing_with(
        mut self,
        make_error: impl Fn(&str) -> ClientError + Send + Sync + 'static,
    ) -> Self {
        self.error = Some(Arc::new(make_error));
        self
    }
}

impl Authenticator for FakeKeystoneAuth {
    fn get_auth(&self, request: &AuthRequest) -> Result<Option<AuthCredentials>, ClientError> {
        if let Some(make_error) = &self.error {
            return Err(make_error("test"));
        }

        if request.os_options != self.os_options {
            tracing::debug!("os_options mismatch: {:?}", request.os_options);
            return Ok(None);
        }

        let secure = request.auth_url.starts_with("https");
        if secure && request.auth_url.ends_with("invalid-certificate") && !request.insecure {
            return Err(ClientError::Certificate("invalid-certificate".to_string()));
        }
        if secure
            && request.auth_url.ends_with("self-signed-certificate")
            && !request.insecure
            && request.cacert.is_none()
        {
            return Err(ClientError::Certificate(
                "unverified-certificate".to_string(),
            ));
        }

        for (name, expected) in &self.required {
            if request.option(name).as_ref() != Some(expected) {
                tracing::debug!("required option {name} mismatch");
                return Ok(None);
            }
        }

        tracing::info!("stub login accepted for {}", request.user);
        Ok(Some(AuthCredentials {
            storage_url: STUB_STORAGE_URL.to_string(),
            token: STUB_TOKEN.to_string(),
        }))
    }
}
