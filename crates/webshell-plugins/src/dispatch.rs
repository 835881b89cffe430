//! Page events fanned out to active plugins.
//!
//! Plugins are visited in activation order. The first hook that fails stops
//! delivery of that event to the remaining plugins and is returned to the
//! host.

use std::ffi::OsStr;

use tracing::{debug, trace};

use crate::error::{HookKind, HookResult, PluginError, PluginResult};
use crate::host::{Channel, InjectionPoint, Page, ResourceKind};
use crate::manager::PluginManager;
use crate::plugin::Plugin;

impl PluginManager {
    /// A page is about to navigate.
    ///
    /// Runs every `before_load` hook, then injects the resource manifests of
    /// all active plugins into `page`.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure; resources are not injected in that
    /// case.
    pub fn before_load(
        &mut self,
        channel: &mut dyn Channel,
        page: &mut dyn Page,
    ) -> PluginResult<()> {
        self.for_each_active(HookKind::BeforeLoad, |plugin| {
            plugin
                .as_on_before_load()
                .map(|hook| hook.before_load(&mut *channel, &mut *page))
        })?;
        self.inject_resources(page);
        Ok(())
    }

    /// A page started loading.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure.
    pub fn load_started(&mut self, page: &mut dyn Page) -> PluginResult<()> {
        self.for_each_active(HookKind::LoadStarted, |plugin| {
            plugin
                .as_on_load_started()
                .map(|hook| hook.load_started(&mut *page))
        })
    }

    /// A page finished loading.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure.
    pub fn load_finished(&mut self, page: &mut dyn Page) -> PluginResult<()> {
        self.for_each_active(HookKind::LoadFinished, |plugin| {
            plugin
                .as_on_load_finished()
                .map(|hook| hook.load_finished(&mut *page))
        })
    }

    /// The page bridge is ready: inject every active plugin's resources.
    ///
    /// Returns the number of resources handed to the page.
    pub fn bridge_initialize(&self, page: &mut dyn Page) -> usize {
        self.inject_resources(page)
    }

    fn for_each_active<F>(&mut self, kind: HookKind, mut call: F) -> PluginResult<()>
    where
        F: FnMut(&mut dyn Plugin) -> Option<HookResult>,
    {
        let names = self.registry.active_names().to_vec();
        for name in names {
            let Some(entry) = self.registry.get_mut(&name) else {
                continue;
            };
            match call(entry.plugin_mut()) {
                Some(result) => {
                    trace!(plugin = %name, hook = %kind, "Dispatched hook");
                    result.map_err(|e| PluginError::hook(&name, kind, e))?;
                },
                None => trace!(plugin = %name, hook = %kind, "Plugin has no hook"),
            }
        }
        Ok(())
    }

    fn inject_resources(&self, page: &mut dyn Page) -> usize {
        let mut injected = 0_usize;
        for name in self.registry.active_names() {
            let Some(entry) = self.registry.get(name) else {
                continue;
            };
            for resource in entry.resources() {
                let Some(file_name) = resource.file_name().and_then(OsStr::to_str) else {
                    debug!(plugin = %name, path = %resource.display(), "Skipping resource without a file name");
                    continue;
                };
                let injection_name = format!("{name}_{file_name}");
                match ResourceKind::of(resource) {
                    Some(ResourceKind::Script) => {
                        page.inject_script(resource, &injection_name, InjectionPoint::DocumentReady);
                    },
                    Some(ResourceKind::Stylesheet) => {
                        page.inject_stylesheet(
                            resource,
                            &injection_name,
                            InjectionPoint::DocumentReady,
                        );
                    },
                    None => {
                        debug!(plugin = %name, path = %resource.display(), "Skipping resource of unknown type");
                        continue;
                    },
                }
                trace!(plugin = %name, resource = %injection_name, "Injected resource");
                injected = injected.saturating_add(1);
            }
        }
        injected
    }
}
