//! Webshell Telemetry - logging for the webshell host.
//!
//! Every crate in the workspace reports through `tracing`; this crate installs
//! the subscriber once at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use webshell_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), webshell_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("webshell_plugins=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
