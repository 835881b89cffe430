//! The seam between the manager and concrete plugin code.

use std::collections::HashMap;

use tracing::debug;

use crate::descriptor::PluginDescriptor;
use crate::error::{PluginError, PluginResult};
use crate::plugin::Plugin;

/// Turns a validated descriptor into live plugin code.
///
/// The manager calls `load` at most once per plugin name for the lifetime of
/// the process; the returned handle is kept until teardown.
pub trait PluginLoader {
    /// Load the module described by `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the module cannot be loaded. The manager leaves
    /// no registry entry behind in that case.
    fn load(&mut self, descriptor: &PluginDescriptor) -> PluginResult<Box<dyn Plugin>>;
}

impl<F> PluginLoader for F
where
    F: FnMut(&PluginDescriptor) -> PluginResult<Box<dyn Plugin>>,
{
    fn load(&mut self, descriptor: &PluginDescriptor) -> PluginResult<Box<dyn Plugin>> {
        self(descriptor)
    }
}

/// Factory for a compiled-in plugin.
pub type PluginFactory = Box<dyn Fn(&PluginDescriptor) -> Box<dyn Plugin>>;

/// Loader for plugins linked into the host binary.
///
/// Factories are keyed by module file stem, so a descriptor with
/// `Module = "test"` is served by the factory registered as `"test"`.
#[derive(Default)]
pub struct BuiltinLoader {
    factories: HashMap<String, PluginFactory>,
}

impl BuiltinLoader {
    /// Create a loader with no factories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for modules named `stem`, replacing any previous one.
    #[must_use]
    pub fn with<F>(mut self, stem: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&PluginDescriptor) -> Box<dyn Plugin> + 'static,
    {
        self.register(stem, factory);
        self
    }

    /// Register `factory` for modules named `stem`, replacing any previous one.
    pub fn register<F>(&mut self, stem: impl Into<String>, factory: F)
    where
        F: Fn(&PluginDescriptor) -> Box<dyn Plugin> + 'static,
    {
        self.factories.insert(stem.into(), Box::new(factory));
    }

    /// Whether a factory exists for `stem`.
    #[must_use]
    pub fn contains(&self, stem: &str) -> bool {
        self.factories.contains_key(stem)
    }
}

impl PluginLoader for BuiltinLoader {
    fn load(&mut self, descriptor: &PluginDescriptor) -> PluginResult<Box<dyn Plugin>> {
        let stem = descriptor.module_stem().unwrap_or_default();
        let factory = self
            .factories
            .get(stem)
            .ok_or_else(|| PluginError::LoadFailed {
                plugin: descriptor.name.clone(),
                message: format!("no built-in plugin registered for module '{stem}'"),
            })?;

        debug!(plugin = %descriptor.name, module = stem, "Instantiating built-in plugin");
        Ok(factory(descriptor))
    }
}

impl std::fmt::Debug for BuiltinLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut stems: Vec<_> = self.factories.keys().collect();
        stems.sort();
        f.debug_struct("BuiltinLoader")
            .field("modules", &stems)
            .finish()
    }
}
