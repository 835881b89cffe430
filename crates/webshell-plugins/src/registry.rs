//! Plugin runtime registry.
//!
//! Stores every plugin that was loaded during the process lifetime, keyed by
//! name, together with its resource manifest and activation state. The
//! registry only records what the manager hands it; it never loads or
//! activates anything itself.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::plugin::Plugin;

/// Lifecycle state of a registered plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    /// Module loaded, never activated.
    Loaded,
    /// In the active set.
    Activated,
    /// Was active, has been deactivated.
    Deactivated,
}

impl PluginState {
    /// Lower-case label for display.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Activated => "active",
            Self::Deactivated => "inactive",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded plugin and its bookkeeping.
pub struct PluginRuntimeEntry {
    name: String,
    module_path: PathBuf,
    plugin: Box<dyn Plugin>,
    resources: Vec<PathBuf>,
    state: PluginState,
}

impl PluginRuntimeEntry {
    /// Wrap a freshly loaded plugin. The entry starts in
    /// [`PluginState::Loaded`] with no resources.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        module_path: impl Into<PathBuf>,
        plugin: Box<dyn Plugin>,
    ) -> Self {
        Self {
            name: name.into(),
            module_path: module_path.into(),
            plugin,
            resources: Vec::new(),
            state: PluginState::Loaded,
        }
    }

    /// Attach the resource manifest.
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<PathBuf>) -> Self {
        self.resources = resources;
        self
    }

    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module the plugin was loaded from.
    #[must_use]
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    /// Resolved resource manifest.
    #[must_use]
    pub fn resources(&self) -> &[PathBuf] {
        &self.resources
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PluginState {
        self.state
    }

    /// Whether the plugin is in the active set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == PluginState::Activated
    }

    /// The plugin itself.
    pub fn plugin_mut(&mut self) -> &mut dyn Plugin {
        self.plugin.as_mut()
    }
}

impl fmt::Debug for PluginRuntimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRuntimeEntry")
            .field("name", &self.name)
            .field("module_path", &self.module_path)
            .field("resources", &self.resources)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Registry of loaded plugins.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: HashMap<String, PluginRuntimeEntry>,
    /// Registration order.
    order: Vec<String>,
    /// Activation order; a subset of `order`.
    active: Vec<String>,
}

impl PluginRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` unless its name is already registered.
    ///
    /// Registering an existing name leaves the registry unchanged and returns
    /// the entry that was already there; `entry` is dropped.
    pub fn register(&mut self, entry: PluginRuntimeEntry) -> &mut PluginRuntimeEntry {
        match self.entries.entry(entry.name.clone()) {
            Entry::Occupied(existing) => {
                debug!(plugin = %entry.name, "Plugin already registered, keeping existing entry");
                existing.into_mut()
            },
            Entry::Vacant(slot) => {
                info!(plugin = %entry.name, module = %entry.module_path.display(), "Registered plugin");
                self.order.push(entry.name.clone());
                slot.insert(entry)
            },
        }
    }

    /// Look up a plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PluginRuntimeEntry> {
        self.entries.get(name)
    }

    /// Look up a plugin by name for mutation.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PluginRuntimeEntry> {
        self.entries.get_mut(name)
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Replace the resource manifest of `name`. Returns `false` if the plugin
    /// is not registered.
    pub fn set_resources(&mut self, name: &str, resources: Vec<PathBuf>) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.resources = resources;
                true
            },
            None => false,
        }
    }

    /// Put `name` at the end of the active set. Returns `false` if it is not
    /// registered or already active.
    pub fn mark_active(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };
        if entry.is_active() {
            return false;
        }
        entry.state = PluginState::Activated;
        self.active.push(name.to_string());
        true
    }

    /// Remove `name` from the active set. Returns `false` if it was not
    /// active.
    pub fn mark_inactive(&mut self, name: &str) -> bool {
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };
        if !entry.is_active() {
            return false;
        }
        entry.state = PluginState::Deactivated;
        self.active.retain(|n| n != name);
        true
    }

    /// Whether `name` is in the active set.
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.get(name).is_some_and(PluginRuntimeEntry::is_active)
    }

    /// Active plugin names, in activation order.
    #[must_use]
    pub fn active_names(&self) -> &[String] {
        &self.active
    }

    /// Every entry, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &PluginRuntimeEntry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
