#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Settings store for the webshell host.
//!
//! [`Settings`] holds a TOML document addressed by dotted keys
//! (`plugins.test.enabled`). Every effective write is persisted to the backing
//! file, if any, and then announced on [`Settings::changed`] so that
//! components such as the plugin manager can react.
//!
//! # Usage
//!
//! ```rust
//! use webshell_config::Settings;
//!
//! let mut settings = Settings::in_memory();
//! settings.subscribe_prefix("plugins.", |change| {
//!     println!("{} -> {:?}", change.key, change.value);
//!     Ok(())
//! });
//!
//! assert!(settings.set("plugins.test.enabled", true).unwrap());
//! assert_eq!(settings.get_bool("plugins.test.enabled"), Some(true));
//! ```
//!
//! [`ShellConfig`] is the typed view used at startup (`[shell]` and `[log]`).

/// Configuration error types.
pub mod error;
/// Dotted-key settings document.
pub mod settings;
/// Host shell configuration sections.
pub mod shell;

pub use error::{ConfigError, ConfigResult};
pub use settings::{SettingChange, Settings};
pub use shell::{LogSection, ShellConfig, ShellSection, default_config_path};
