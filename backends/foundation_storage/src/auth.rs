//! Authentication boundary.
//!
//! The client hands an [`AuthRequest`] to an [`Authenticator`] and gets back
//! the storage URL and token to use for every later request.

use std::collections::BTreeMap;

use crate::errors::ClientError;

/// Everything presented to the identity service for one login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    pub auth_url: String,
    pub user: String,
    pub key: String,
    /// Keystone-style scoping options (tenant, region, endpoint type, ...).
    pub os_options: BTreeMap<String, String>,
    pub insecure: bool,
    pub cacert: Option<String>,
    /// Additional keyword options the caller passed through.
    pub extra: BTreeMap<String, String>,
}

impl AuthRequest {
    #[must_use]
    pub fn new(
        auth_url: impl Into<String>,
        user: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            user: user.into(),
            key: key.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_os_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.os_options.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    #[must_use]
    pub fn with_cacert(mut self, cacert: impl Into<String>) -> Self {
        self.cacert = Some(cacert.into());
        self
    }

    /// Looks up a keyword option by name, including `insecure` and `cacert`.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<String> {
        match name {
            "insecure" => Some(self.insecure.to_string()),
            "cacert" => self.cacert.clone(),
            other => self.extra.get(other).cloned(),
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub storage_url: String,
    pub token: String,
}

pub trait Authenticator {
    /// Logs in, returning `Ok(None)` when the identity service accepted the
    /// exchange but issued no credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the exchange itself fails.
    fn get_auth(&self, request: &AuthRequest) -> Result<Option<AuthCredentials>, ClientError>;
}
