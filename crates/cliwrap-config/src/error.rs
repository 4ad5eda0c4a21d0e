use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, reading or validating a wrapper config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}
