//! Declarative scripts loaded from TOML.
//!
//! ```toml
//! statuses = [-1, 503, 200]
//! etags = ["", "", "abc"]
//! body = "payload"
//! missing_container = false
//!
//! [headers]
//! x-object-meta-color = "blue"
//! ```
//!
//! Hooks cannot be expressed in a file; attach them to the returned
//! [`ScriptConfig`].

use core::time::Duration;
use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use super::{MissingContainer, ScriptConfig};
use crate::errors::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptFile {
    pub statuses: Vec<i32>,
    pub timestamps: Vec<String>,
    /// Empty entries keep the baseline etag.
    pub etags: Vec<String>,
    pub missing_container: Option<MissingContainer>,
    pub body: String,
    pub slow: bool,
    pub slow_delay_ms: Option<u64>,
    pub headers: BTreeMap<String, String>,
    pub auth_v1: bool,
    pub raise_exc: bool,
}

impl ScriptFile {
    /// # Errors
    ///
    /// Returns [`ConfigError::DeserializationFailed`] for malformed TOML or
    /// unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::IOError`] when the file cannot be read, or
    /// [`ConfigError::DeserializationFailed`] when it does not parse.
    pub fn from_path<V: Into<PathBuf>>(target: V) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(target.into())?;
        Self::from_toml_str(&content)
    }

    /// Splits the file into its statuses and the equivalent configuration.
    #[must_use]
    pub fn into_parts(self) -> (Vec<i32>, ScriptConfig) {
        let etags = self
            .etags
            .into_iter()
            .map(Some)
            .collect();

        let mut config = ScriptConfig::new()
            .timestamps(self.timestamps)
            .optional_etags(etags)
            .body(self.body);

        if let Some(missing) = self.missing_container {
            config = config.missing_container(missing);
        }
        if self.slow {
            config = config.slow();
        }
        if let Some(delay) = self.slow_delay_ms {
            config = config.slow_delay(Duration::from_millis(delay));
        }
        for (name, value) in self.headers {
            config = config.header(name, value);
        }
        if self.auth_v1 {
            config = config.auth_v1();
        }
        if self.raise_exc {
            config = config.raise_exc();
        }

        (self.statuses, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_script_file() {
        let file = ScriptFile::from_toml_str(
            r#"
statuses = [-1, 503, 200]
timestamps = ["1", "", "3"]
etags = ["", "", "abc"]
missing_container = [true, false]
body = "payload"
slow = true
slow_delay_ms = 5
auth_v1 = true

[headers]
x-object-meta-color = "blue"
"#,
        )
        .expect("should parse");

        let (statuses, config) = file.into_parts();
        assert_eq!(statuses, vec![-1, 503, 200]);
        assert_eq!(config.get_timestamp(1), None);
        assert_eq!(config.get_etag(0), None);
        assert_eq!(config.get_etag(2).as_deref(), Some("abc"));
        assert!(config.get_missing_container().for_attempt(0));
        assert!(config.is_slow());
        assert_eq!(config.get_slow_delay(), Duration::from_millis(5));
        assert!(config.is_auth_v1());
        assert!(!config.should_raise_exc());
        assert_eq!(
            config.get_headers(),
            &[("x-object-meta-color".to_string(), "blue".to_string())]
        );
    }

    #[test]
    fn test_missing_container_accepts_single_flag() {
        let file = ScriptFile::from_toml_str("statuses = [200]\nmissing_container = true\n")
            .expect("should parse");
        assert_eq!(file.missing_container, Some(MissingContainer::Always(true)));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = ScriptFile::from_toml_str("statuses = [200]\nretries = 3\n")
            .expect_err("unknown key should fail");
        assert!(matches!(err, ConfigError::DeserializationFailed(_)));
    }
}
