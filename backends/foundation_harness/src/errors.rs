use derive_more::From;
use foundation_storage::{ClientError, TransportError};

pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, From)]
pub enum ConfigError {
    #[from(ignore)]
    IOError(std::io::Error),

    #[from(ignore)]
    DeserializationFailed(toml::de::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::DeserializationFailed(value)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Errors raised by the fake transport itself.
#[derive(Debug, From)]
pub enum HarnessError {
    /// Scripted transport fault, what a real socket failure looks like.
    #[from]
    Transport(TransportError),

    /// More attempts were issued than the script has outcomes for. This is
    /// a test-authoring mistake, never a condition a client should recover
    /// from.
    #[from(ignore)]
    ScriptExhausted { scripted: usize },

    #[from]
    Config(ConfigError),
}

impl std::error::Error for HarnessError {}

impl core::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::ScriptExhausted { scripted } => write!(
                f,
                "connection script exhausted: all {scripted} scripted attempts were already issued"
            ),
            Self::Config(err) => write!(f, "invalid script configuration: {err}"),
        }
    }
}

impl From<HarnessError> for ClientError {
    fn from(err: HarnessError) -> Self {
        match err {
            HarnessError::Transport(inner) => ClientError::Transport(inner),
            other => ClientError::Other(Box::new(other)),
        }
    }
}
