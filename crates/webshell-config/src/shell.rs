//! Typed view over the `[shell]` and `[log]` sections.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::settings::Settings;

/// Default directory name searched for plugins.
pub const DEFAULT_PLUGIN_DIR: &str = "plugins";

/// Default plugin module extension.
pub const DEFAULT_MODULE_EXTENSION: &str = "wasm";

/// Settings file name inside the platform config directory.
pub const SETTINGS_FILE_NAME: &str = "webshell.toml";

/// Host shell options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSection {
    /// Directories scanned for `*.plugin` descriptors. Relative entries are
    /// resolved against the settings file's directory.
    pub plugin_dirs: Vec<PathBuf>,
    /// Extension appended to descriptor `Module` values that lack it.
    pub module_extension: String,
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            plugin_dirs: vec![PathBuf::from(DEFAULT_PLUGIN_DIR)],
            module_extension: DEFAULT_MODULE_EXTENSION.to_owned(),
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["webshell_plugins=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

/// Host configuration read from [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellConfig {
    /// `[shell]` section.
    pub shell: ShellSection,
    /// `[log]` section.
    pub log: LogSection,
}

impl ShellConfig {
    /// Read both sections, falling back to defaults for absent ones.
    ///
    /// Relative plugin directories are resolved against the directory of the
    /// settings file; in-memory settings leave them untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a section exists but has the wrong shape.
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        let mut shell: ShellSection = settings.section("shell")?;
        let log: LogSection = settings.section("log")?;

        if let Some(base) = settings.path().and_then(Path::parent) {
            shell.plugin_dirs = shell
                .plugin_dirs
                .into_iter()
                .map(|d| if d.is_absolute() { d } else { base.join(d) })
                .collect();
        }

        Ok(Self { shell, log })
    }
}

/// Location of the user settings file (`<config dir>/webshell/webshell.toml`).
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if the platform exposes no
/// configuration directory.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    directories::ProjectDirs::from("", "", "webshell")
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}
