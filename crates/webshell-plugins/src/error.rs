//! Plugin error types.

use std::fmt;
use std::path::PathBuf;

use webshell_events::{HandlerError, SignalError};

/// Why a descriptor file was rejected during a scan.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// The descriptor could not be read.
    #[error("failed to read descriptor {}: {source}", path.display())]
    Io {
        /// Descriptor file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid TOML or has the wrong shape.
    #[error("failed to parse descriptor {}: {source}", path.display())]
    Parse {
        /// Descriptor file.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A required key is absent or empty.
    #[error("descriptor {} is missing required key '{key}'", path.display())]
    MissingKey {
        /// Descriptor file.
        path: PathBuf,
        /// The missing key (`plugin`, `Name` or `Module`).
        key: &'static str,
    },

    /// The resolved module file does not exist.
    #[error(
        "module {} declared by {} does not exist",
        module.display(),
        path.display()
    )]
    ModuleNotFound {
        /// Descriptor file.
        path: PathBuf,
        /// Resolved module path.
        module: PathBuf,
    },
}

/// Result type for descriptor parsing.
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Error returned by a plugin hook.
///
/// Hooks and signal handlers fail the same way, so this is the handler error
/// from `webshell-events`.
pub type HookError = HandlerError;

/// Result type returned by plugin hooks.
pub type HookResult = Result<(), HookError>;

/// The hook a plugin was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Entering the active set.
    Activate,
    /// Leaving the active set.
    Deactivate,
    /// Page about to navigate.
    BeforeLoad,
    /// Page navigation started.
    LoadStarted,
    /// Page navigation finished.
    LoadFinished,
}

impl HookKind {
    /// Every hook, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Activate,
        Self::Deactivate,
        Self::BeforeLoad,
        Self::LoadStarted,
        Self::LoadFinished,
    ];

    /// Snake-case hook name, also used as the WASM export name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::BeforeLoad => "before_load",
            Self::LoadStarted => "load_started",
            Self::LoadFinished => "load_finished",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// No valid descriptor with this name exists in any plugin directory.
    #[error("plugin not found: {0}")]
    NotFound(String),

    /// The plugin module could not be loaded.
    #[error("plugin load failed: {plugin} - {message}")]
    LoadFailed {
        /// Plugin name.
        plugin: String,
        /// Failure reason.
        message: String,
    },

    /// A plugin hook returned an error.
    #[error("plugin '{plugin}' failed in {hook} hook: {source}")]
    Hook {
        /// Plugin name.
        plugin: String,
        /// The failing hook.
        hook: HookKind,
        /// The plugin's error.
        #[source]
        source: HookError,
    },

    /// An observer of plugin lifecycle events failed.
    #[error("plugin event subscriber failed: {0}")]
    Notification(#[from] SignalError),

    /// A plugin directory was rejected.
    #[error("invalid plugin directory {}: {message}", path.display())]
    InvalidPluginDir {
        /// The rejected directory.
        path: PathBuf,
        /// Why it was rejected.
        message: String,
    },
}

impl PluginError {
    pub(crate) fn hook(plugin: &str, hook: HookKind, source: HookError) -> Self {
        Self::Hook {
            plugin: plugin.to_string(),
            hook,
            source,
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
