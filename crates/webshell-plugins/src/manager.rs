//! Plugin lifecycle controller.
//!
//! [`PluginManager`] ties the descriptor store, the loader and the registry
//! together and keeps the active set in line with the
//! `plugins.<name>.enabled` settings.
//!
//! ```text
//! Discovered ──load──▶ Loaded ──activate──▶ Activated ◀──▶ Deactivated
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, info, trace, warn};
use webshell_config::{SettingChange, Settings, ShellSection};
use webshell_events::{HandlerError, Signal, SubscriberId};

use crate::descriptor::PluginDescriptor;
use crate::discovery::DescriptorStore;
use crate::error::{HookKind, PluginError, PluginResult};
use crate::loader::PluginLoader;
use crate::registry::{PluginRegistry, PluginRuntimeEntry, PluginState};

/// Settings namespace holding per-plugin options.
pub const PLUGINS_PREFIX: &str = "plugins.";

const ENABLED_SUFFIX: &str = ".enabled";

/// Settings key holding the enabled flag of `name`.
#[must_use]
pub fn enabled_key(name: &str) -> String {
    format!("{PLUGINS_PREFIX}{name}{ENABLED_SUFFIX}")
}

/// Plugin name addressed by an enabled-flag key, if `key` is one.
#[must_use]
pub fn plugin_name_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(PLUGINS_PREFIX)?
        .strip_suffix(ENABLED_SUFFIX)
        .filter(|name| !name.is_empty())
}

/// Lifecycle notifications. Every payload is the plugin name.
#[derive(Debug)]
pub struct ManagerEvents {
    /// A plugin joined the active set.
    pub plugin_added: Signal<String>,
    /// A plugin left the active set.
    pub plugin_removed: Signal<String>,
    /// A plugin's activate step completed. Emitted before `plugin_added`.
    pub plugin_activated: Signal<String>,
    /// A plugin's deactivate step completed. Emitted before `plugin_removed`.
    pub plugin_deactivated: Signal<String>,
}

impl Default for ManagerEvents {
    fn default() -> Self {
        Self {
            plugin_added: Signal::new("plugin-added"),
            plugin_removed: Signal::new("plugin-removed"),
            plugin_activated: Signal::new("plugin-activated"),
            plugin_deactivated: Signal::new("plugin-deactivated"),
        }
    }
}

/// What a call to [`PluginManager::scan_and_load`] did.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Plugins loaded and registered by this scan.
    pub loaded: Vec<String>,
    /// Plugins activated by this scan.
    pub activated: Vec<String>,
    /// Number of descriptor files rejected.
    pub rejected: usize,
    /// Plugins whose module failed to load.
    pub load_failures: Vec<(String, PluginError)>,
    /// Activation errors. A plugin whose activate hook failed stays
    /// registered but inactive. A plugin whose lifecycle subscriber failed
    /// is active and also listed in `activated`.
    pub activation_failures: Vec<PluginError>,
}

/// Snapshot of one registered plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginStatus {
    /// Plugin name.
    pub name: String,
    /// Lifecycle state.
    pub state: PluginState,
    /// Module file.
    pub module_path: PathBuf,
    /// Resource manifest.
    pub resources: Vec<PathBuf>,
}

/// Owns every loaded plugin and drives its lifecycle.
///
/// The manager is single-threaded. Hosts that want settings changes applied
/// automatically keep it in an `Rc<RefCell<_>>` and call
/// [`watch_settings`](Self::watch_settings).
pub struct PluginManager {
    store: DescriptorStore,
    loader: Box<dyn PluginLoader>,
    pub(crate) registry: PluginRegistry,
    events: ManagerEvents,
}

impl PluginManager {
    /// Create a manager over `store`, loading modules with `loader`.
    #[must_use]
    pub fn new(store: DescriptorStore, loader: impl PluginLoader + 'static) -> Self {
        Self {
            store,
            loader: Box::new(loader),
            registry: PluginRegistry::new(),
            events: ManagerEvents::default(),
        }
    }

    /// Create a manager from the `[shell]` settings section.
    #[must_use]
    pub fn from_config(shell: &ShellSection, loader: impl PluginLoader + 'static) -> Self {
        let store = DescriptorStore::new(shell.plugin_dirs.iter(), shell.module_extension.as_str());
        Self::new(store, loader)
    }

    /// Lifecycle signals.
    #[must_use]
    pub fn events(&self) -> &ManagerEvents {
        &self.events
    }

    /// The loaded plugins.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Directories searched for descriptors.
    #[must_use]
    pub fn plugin_dirs(&self) -> &[PathBuf] {
        self.store.dirs()
    }

    /// Whether `name` is currently active.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.registry.is_active(name)
    }

    /// Status of every loaded plugin, in load order.
    #[must_use]
    pub fn plugins(&self) -> Vec<PluginStatus> {
        self.registry
            .iter()
            .map(|entry| PluginStatus {
                name: entry.name().to_string(),
                state: entry.state(),
                module_path: entry.module_path().to_path_buf(),
                resources: entry.resources().to_vec(),
            })
            .collect()
    }

    /// Scan every plugin directory and bring new plugins up.
    ///
    /// Each valid descriptor whose name is not registered yet is loaded and
    /// registered. Its `plugins.<name>.enabled` flag is read, written as
    /// `true` when absent, and the plugin is activated if the flag is set.
    /// Plugins registered by an earlier scan are left alone.
    ///
    /// Nothing here is fatal: rejected descriptors, load failures and failing
    /// activate hooks are logged and collected in the report.
    pub fn scan_and_load(&mut self, settings: &mut Settings) -> ScanReport {
        let scan = self.store.scan();
        let mut report = ScanReport {
            rejected: scan.rejected.len(),
            ..ScanReport::default()
        };

        for descriptor in scan.descriptors {
            let name = descriptor.name.clone();
            if self.registry.contains(&name) {
                trace!(plugin = %name, "Plugin already loaded, skipping");
                continue;
            }

            if let Err(e) = self.load_descriptor(&descriptor) {
                report.load_failures.push((name, e));
                continue;
            }
            report.loaded.push(name.clone());

            if !read_enabled_flag(settings, &name) {
                debug!(plugin = %name, "Plugin disabled in settings");
                continue;
            }
            match self.activate(&name) {
                Ok(()) => report.activated.push(name),
                Err(e) => {
                    warn!(plugin = %name, error = %e, "Plugin activation failed");
                    if self.registry.is_active(&name) {
                        report.activated.push(name);
                    }
                    report.activation_failures.push(e);
                },
            }
        }

        info!(
            loaded = report.loaded.len(),
            activated = report.activated.len(),
            rejected = report.rejected,
            failed = report.load_failures.len(),
            "Plugin scan finished"
        );
        report
    }

    /// Load and register `name` without activating it.
    ///
    /// Already-registered plugins are returned as they are. Otherwise every
    /// plugin directory is scanned again for a valid descriptor with that
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] if no valid descriptor exists, or the
    /// loader's error if the module fails to load.
    pub fn load_plugin(&mut self, name: &str) -> PluginResult<&PluginRuntimeEntry> {
        if !self.registry.contains(name) {
            let scan = self.store.scan();
            let descriptor = scan
                .find(name)
                .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
            self.load_descriptor(descriptor)?;
        }
        self.registry
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }

    /// Bring `name` into the active set.
    ///
    /// Loads the plugin first if needed, then runs its activate hook, marks
    /// it active and emits `plugin_activated` followed by `plugin_added`.
    /// Returns `Ok(false)` when the plugin cannot be loaded; that failure is
    /// logged, not raised. Enabling an active plugin does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Hook`] if the activate hook fails (the plugin
    /// stays inactive), or [`PluginError::Notification`] if a lifecycle
    /// subscriber fails (the plugin is active by then).
    pub fn enable(&mut self, name: &str) -> PluginResult<bool> {
        if self.registry.is_active(name) {
            trace!(plugin = %name, "Plugin already active");
            return Ok(true);
        }

        info!(plugin = %name, "Enabling plugin");
        if let Err(e) = self.load_plugin(name) {
            warn!(plugin = %name, error = %e, "Unable to activate plugin");
            return Ok(false);
        }

        self.activate(name)?;
        Ok(true)
    }

    /// Take `name` out of the active set.
    ///
    /// Runs the deactivate hook, marks the plugin inactive and emits
    /// `plugin_deactivated` followed by `plugin_removed`. Returns `false` if
    /// the plugin was not active, in which case nothing happens.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Hook`] if the deactivate hook fails. The plugin
    /// is inactive and both events have been emitted regardless.
    pub fn disable(&mut self, name: &str) -> PluginResult<bool> {
        let Some(entry) = self.registry.get_mut(name).filter(|e| e.is_active()) else {
            trace!(plugin = %name, "Plugin not active, nothing to disable");
            return Ok(false);
        };

        info!(plugin = %name, "Disabling plugin");
        let hook_result = match entry.plugin_mut().as_on_deactivate() {
            Some(hook) => hook
                .deactivate()
                .map_err(|e| PluginError::hook(name, HookKind::Deactivate, e)),
            None => Ok(()),
        };

        self.registry.mark_inactive(name);
        let payload = name.to_string();
        let notified = self
            .events
            .plugin_deactivated
            .emit(&payload)
            .and_then(|()| self.events.plugin_removed.emit(&payload));

        hook_result?;
        notified?;
        Ok(true)
    }

    /// React to a settings change.
    ///
    /// Only `plugins.<name>.enabled` keys are considered. A boolean value
    /// enables or disables the plugin; any other value is ignored with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`enable`](Self::enable) and
    /// [`disable`](Self::disable).
    pub fn handle_setting_change(&mut self, change: &SettingChange) -> PluginResult<()> {
        let Some(name) = plugin_name_from_key(&change.key) else {
            return Ok(());
        };

        match (change.as_bool(), &change.value) {
            (Some(true), _) => self.enable(name).map(drop),
            (Some(false), _) => self.disable(name).map(drop),
            (None, Some(value)) => {
                warn!(key = %change.key, value = %value, "Ignoring non-boolean plugin flag");
                Ok(())
            },
            (None, None) => {
                debug!(key = %change.key, "Plugin flag removed, leaving plugin as is");
                Ok(())
            },
        }
    }

    /// Subscribe `this` to enabled-flag changes on `settings`.
    ///
    /// The subscription holds a weak reference, so it becomes inert once the
    /// manager is dropped. Changes emitted while the manager is already
    /// borrowed (its own default-flag writes during a scan) are skipped: the
    /// manager handles those plugins itself.
    pub fn watch_settings(this: &Rc<RefCell<Self>>, settings: &Settings) -> SubscriberId {
        let weak = Rc::downgrade(this);
        settings.subscribe_prefix(PLUGINS_PREFIX, move |change: &SettingChange| {
            let Some(manager) = weak.upgrade() else {
                return Ok(());
            };
            let Ok(mut manager) = manager.try_borrow_mut() else {
                trace!(key = %change.key, "Plugin manager busy, change handled in place");
                return Ok(());
            };
            manager
                .handle_setting_change(change)
                .map_err(HandlerError::new)
        })
    }

    /// Add a plugin directory and pick up the plugins it contains.
    ///
    /// A missing directory is created when possible; if that fails the
    /// directory is ignored. Adding a directory that is already searched
    /// does nothing. Returns the scan report when a scan ran.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidPluginDir`] if `dir` is relative.
    pub fn add_plugin_dir(
        &mut self,
        dir: &Path,
        settings: &mut Settings,
    ) -> PluginResult<Option<ScanReport>> {
        if !dir.is_absolute() {
            return Err(PluginError::InvalidPluginDir {
                path: dir.to_path_buf(),
                message: "plugin directories must be absolute".to_string(),
            });
        }

        if !dir.exists() {
            match std::fs::create_dir_all(dir) {
                Ok(()) => info!(path = %dir.display(), "Created plugin directory"),
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Cannot create plugin directory, ignoring it");
                    return Ok(None);
                },
            }
        }

        if !self.store.add_dir(dir) {
            debug!(path = %dir.display(), "Plugin directory already registered");
            return Ok(None);
        }

        info!(path = %dir.display(), "Added plugin directory");
        Ok(Some(self.scan_and_load(settings)))
    }

    fn load_descriptor(&mut self, descriptor: &PluginDescriptor) -> PluginResult<()> {
        let plugin = self.loader.load(descriptor).inspect_err(|e| {
            warn!(plugin = %descriptor.name, error = %e, "Unable to load plugin module");
        })?;

        let entry = PluginRuntimeEntry::new(&descriptor.name, &descriptor.module_path, plugin)
            .with_resources(descriptor.resources.clone());
        self.registry.register(entry);
        Ok(())
    }

    fn activate(&mut self, name: &str) -> PluginResult<()> {
        let entry = self
            .registry
            .get_mut(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        if let Some(hook) = entry.plugin_mut().as_on_activate() {
            hook.activate()
                .map_err(|e| PluginError::hook(name, HookKind::Activate, e))?;
        }

        self.registry.mark_active(name);
        info!(plugin = %name, "Plugin activated");

        let payload = name.to_string();
        self.events.plugin_activated.emit(&payload)?;
        self.events.plugin_added.emit(&payload)?;
        Ok(())
    }
}

/// Read the enabled flag of `name`, writing `true` when it is absent.
fn read_enabled_flag(settings: &mut Settings, name: &str) -> bool {
    let key = enabled_key(name);
    match settings.get(&key) {
        None => {
            debug!(plugin = %name, "No enabled flag, defaulting to enabled");
            if let Err(e) = settings.set(&key, true) {
                warn!(plugin = %name, error = %e, "Failed to store default enabled flag");
            }
            true
        },
        Some(value) => value.as_bool().unwrap_or_else(|| {
            warn!(key = %key, value = %value, "Plugin flag is not a boolean, treating as disabled");
            false
        }),
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugin_dirs", &self.store.dirs())
            .field("plugins", &self.registry.len())
            .field("active", &self.registry.active_names())
            .finish_non_exhaustive()
    }
}
