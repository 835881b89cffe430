//! Subcommand implementations.

pub(crate) mod plugins;
pub(crate) mod run;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use webshell_config::{Settings, ShellConfig, default_config_path};
use webshell_plugins::{DescriptorStore, PluginManager, ScanReport, WasmLoader};

/// Settings, configuration and extra plugin directories for one invocation.
pub(crate) struct Host {
    pub(crate) settings: Settings,
    pub(crate) config: ShellConfig,
    extra_dirs: Vec<PathBuf>,
}

impl Host {
    /// Open the settings file (`--config` or the platform default).
    pub(crate) fn open(config_path: Option<&Path>, extra_dirs: &[PathBuf]) -> Result<Self> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        let settings = Settings::open(&path)
            .with_context(|| format!("failed to open settings {}", path.display()))?;
        let config = ShellConfig::from_settings(&settings)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;

        let extra_dirs = extra_dirs
            .iter()
            .map(|dir| std::path::absolute(dir).unwrap_or_else(|_| dir.clone()))
            .collect();

        Ok(Self {
            settings,
            config,
            extra_dirs,
        })
    }

    /// Every directory that will be searched, configured ones first.
    pub(crate) fn store(&self) -> DescriptorStore {
        DescriptorStore::new(
            self.config.shell.plugin_dirs.iter().chain(&self.extra_dirs),
            self.config.shell.module_extension.as_str(),
        )
    }

    /// Build the manager, subscribe it to settings changes and load every
    /// plugin from the configured and extra directories.
    pub(crate) fn boot(&mut self) -> Result<(Rc<RefCell<PluginManager>>, ScanReport)> {
        let manager = Rc::new(RefCell::new(PluginManager::from_config(
            &self.config.shell,
            WasmLoader::new(),
        )));
        PluginManager::watch_settings(&manager, &self.settings);

        let mut report = manager.borrow_mut().scan_and_load(&mut self.settings);
        for dir in &self.extra_dirs {
            let added = manager
                .borrow_mut()
                .add_plugin_dir(dir, &mut self.settings)
                .with_context(|| format!("cannot add plugin directory {}", dir.display()))?;
            if let Some(extra) = added {
                merge_reports(&mut report, extra);
            } else {
                debug!(path = %dir.display(), "Plugin directory contributed nothing");
            }
        }
        Ok((manager, report))
    }
}

/// Deactivate every active plugin, most recently activated first.
pub(crate) fn shutdown(manager: &Rc<RefCell<PluginManager>>) {
    let mut manager = manager.borrow_mut();
    let active = manager.registry().active_names().to_vec();
    for name in active.iter().rev() {
        if let Err(e) = manager.disable(name) {
            warn!(plugin = %name, error = %e, "Plugin failed to deactivate cleanly");
        }
    }
}

fn merge_reports(into: &mut ScanReport, from: ScanReport) {
    into.loaded.extend(from.loaded);
    into.activated.extend(from.activated);
    into.rejected = into.rejected.saturating_add(from.rejected);
    into.load_failures.extend(from.load_failures);
    into.activation_failures.extend(from.activation_failures);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_resolves_extra_dirs_and_defaults() {
        let root = tempfile::tempdir().unwrap();
        let config = root.path().join("webshell.toml");
        let host = Host::open(Some(config.as_path()), &[root.path().join("extra")]).unwrap();

        let dirs = host.store().dirs().to_vec();
        assert_eq!(dirs, vec![root.path().join("plugins"), root.path().join("extra")]);
        assert_eq!(host.store().module_extension(), "wasm");
    }

    #[test]
    fn test_boot_with_empty_directories() {
        let root = tempfile::tempdir().unwrap();
        let config = root.path().join("webshell.toml");
        let mut host = Host::open(Some(config.as_path()), &[]).unwrap();

        let (manager, report) = host.boot().unwrap();
        assert!(report.loaded.is_empty());
        assert!(manager.borrow().registry().is_empty());
    }

    #[test]
    fn test_merge_reports() {
        let mut into = ScanReport {
            loaded: vec!["a".into()],
            rejected: 1,
            ..ScanReport::default()
        };
        merge_reports(
            &mut into,
            ScanReport {
                loaded: vec!["b".into()],
                activated: vec!["b".into()],
                rejected: 2,
                ..ScanReport::default()
            },
        );
        assert_eq!(into.loaded, vec!["a", "b"]);
        assert_eq!(into.activated, vec!["b"]);
        assert_eq!(into.rejected, 3);
    }
}
