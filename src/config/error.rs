//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or checking `mina.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid mina.toml")]
    Toml(#[from] toml::de::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("mina.toml"),
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        let display = io_err.to_string();
        assert!(display.contains("cannot read config"));
        assert!(display.contains("mina.toml"));

        let err = ConfigError::Validation("[build.entry] must not be empty".into());
        assert!(err.to_string().ends_with("[build.entry] must not be empty"));
    }

    #[test]
    fn test_toml_error_keeps_source() {
        let toml_err = toml::from_str::<toml::Value>("[build").unwrap_err();
        let err = ConfigError::from(toml_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
