use std::io;

use thiserror::Error;
use webshell_events::SignalError;

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write the settings file.
    #[error("Failed to write config file at {path}: {source}")]
    WriteError {
        /// Path to the file that could not be written.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse the settings file.
    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        /// Path to the file that failed to parse.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Failed to serialize the settings document.
    #[error("Failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The key is not a valid dotted path.
    #[error("Invalid settings key '{key}': {message}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Why it was rejected.
        message: String,
    },

    /// A prefix of the key already holds a non-table value.
    #[error("Settings key '{key}' is not a table")]
    NotATable {
        /// The prefix holding a scalar.
        key: String,
    },

    /// A section did not match its typed representation.
    #[error("Invalid settings section '{section}': {source}")]
    SectionError {
        /// Section name.
        section: String,
        /// Underlying deserialization error.
        #[source]
        source: toml::de::Error,
    },

    /// A change subscriber failed after the value was stored.
    #[error("Settings change notification failed: {0}")]
    Notification(#[from] SignalError),

    /// Could not determine the platform configuration directory.
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
