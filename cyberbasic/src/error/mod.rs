//! Error types for loading programs and setting up a host

use crate::interp::RuntimeError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Load / setup error
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialized program could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Configuration file could not be decoded
    #[error("Config error: {message}")]
    Config { message: String },

    /// A native function name was registered twice
    #[error("Duplicate native function registration: {name}")]
    DuplicateNative { name: String },

    /// Uncaught runtime failure surfaced to the driver
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Io { message } | Self::Parse { message } | Self::Config { message } => {
                message.clone()
            }
            Self::DuplicateNative { name } => name.clone(),
            Self::Runtime(err) => err.message.clone(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_error(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::config_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Error::io_error("missing").to_string(), "IO error: missing");
        assert_eq!(
            Error::DuplicateNative {
                name: "PRINT".to_string()
            }
            .to_string(),
            "Duplicate native function registration: PRINT"
        );
    }

    #[test]
    fn test_runtime_is_transparent() {
        let err: Error = RuntimeError::modulo_by_zero().into();
        assert_eq!(err.to_string(), "Runtime error: Modulo by zero");
        assert_eq!(err.message(), "Modulo by zero");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
