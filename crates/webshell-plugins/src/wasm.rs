//! WebAssembly plugins run through Extism.
//!
//! A module exposes hooks by exporting functions named after them
//! (`activate`, `deactivate`, `before_load`, `load_started`,
//! `load_finished`). Page hooks receive a JSON document describing the page:
//!
//! ```json
//! { "url": "https://example.org/" }
//! ```
//!
//! `before_load` may return a JSON object; each member is registered on the
//! page channel under its key.

use std::collections::HashSet;
use std::time::Duration;

use extism::{Manifest, PluginBuilder, Wasm};
use serde::Serialize;
use tracing::{debug, trace};

use crate::descriptor::PluginDescriptor;
use crate::error::{HookError, HookKind, HookResult, PluginError, PluginResult};
use crate::host::{Channel, Page};
use crate::loader::PluginLoader;
use crate::plugin::{
    OnActivate, OnBeforeLoad, OnDeactivate, OnLoadFinished, OnLoadStarted, Plugin,
};

/// Default maximum WASM linear memory: 16 MB.
const DEFAULT_MAX_MEMORY_BYTES: u64 = 16 * 1024 * 1024;

/// Default maximum execution time per hook call: 5 seconds.
const DEFAULT_MAX_EXECUTION_TIME: Duration = Duration::from_secs(5);

const WASM_PAGE_BYTES: u64 = 64 * 1024;

/// Loader that instantiates `.wasm` modules with Extism.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use webshell_plugins::WasmLoader;
///
/// let loader = WasmLoader::new()
///     .with_memory_limit(8 * 1024 * 1024)
///     .with_timeout(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct WasmLoader {
    max_memory_bytes: u64,
    max_execution_time: Duration,
    wasi: bool,
}

impl Default for WasmLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WasmLoader {
    /// Create a loader with default limits (16 MB memory, 5s per call, no
    /// WASI).
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_memory_bytes: DEFAULT_MAX_MEMORY_BYTES,
            max_execution_time: DEFAULT_MAX_EXECUTION_TIME,
            wasi: false,
        }
    }

    /// Set the maximum WASM linear memory in bytes.
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the maximum execution time per hook call.
    #[must_use]
    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.max_execution_time = duration;
        self
    }

    /// Link WASI into every module.
    #[must_use]
    pub fn with_wasi(mut self, enabled: bool) -> Self {
        self.wasi = enabled;
        self
    }

    /// Get the configured memory limit.
    #[must_use]
    pub fn max_memory_bytes(&self) -> u64 {
        self.max_memory_bytes
    }

    /// Get the configured execution timeout.
    #[must_use]
    pub fn max_execution_time(&self) -> Duration {
        self.max_execution_time
    }
}

impl PluginLoader for WasmLoader {
    fn load(&mut self, descriptor: &PluginDescriptor) -> PluginResult<Box<dyn Plugin>> {
        let load_failed = |message: String| PluginError::LoadFailed {
            plugin: descriptor.name.clone(),
            message,
        };

        let bytes = std::fs::read(&descriptor.module_path).map_err(|e| {
            load_failed(format!(
                "cannot read {}: {e}",
                descriptor.module_path.display()
            ))
        })?;

        let pages = self.max_memory_bytes / WASM_PAGE_BYTES;
        let manifest = Manifest::new([Wasm::data(bytes)])
            .with_timeout(self.max_execution_time)
            .with_memory_max(u32::try_from(pages).unwrap_or(u32::MAX));

        let plugin = PluginBuilder::new(manifest)
            .with_wasi(self.wasi)
            .build()
            .map_err(|e| load_failed(format!("failed to instantiate module: {e}")))?;

        let wasm = WasmPlugin::new(descriptor.name.clone(), plugin);
        debug!(
            plugin = %descriptor.name,
            hooks = ?wasm.hooks(),
            "Loaded WASM plugin"
        );
        Ok(Box::new(wasm))
    }
}

#[derive(Serialize)]
struct PagePayload<'a> {
    url: Option<&'a str>,
}

/// A plugin backed by an Extism instance.
pub struct WasmPlugin {
    name: String,
    instance: extism::Plugin,
    hooks: HashSet<HookKind>,
}

impl WasmPlugin {
    fn new(name: String, instance: extism::Plugin) -> Self {
        let hooks = HookKind::ALL
            .into_iter()
            .filter(|hook| instance.function_exists(hook.as_str()))
            .collect();
        Self {
            name,
            instance,
            hooks,
        }
    }

    /// Hooks exported by the module, in lifecycle order.
    #[must_use]
    pub fn hooks(&self) -> Vec<HookKind> {
        HookKind::ALL
            .into_iter()
            .filter(|h| self.hooks.contains(h))
            .collect()
    }

    fn call(&mut self, hook: HookKind, input: &str) -> Result<String, HookError> {
        trace!(plugin = %self.name, hook = %hook, "Calling WASM hook");
        self.instance
            .call::<&str, String>(hook.as_str(), input)
            .map_err(|e| HookError::msg(format!("WASM call failed: {e}")))
    }

    fn call_with_page(&mut self, hook: HookKind, page: &dyn Page) -> Result<String, HookError> {
        let input = serde_json::to_string(&PagePayload { url: page.url() })
            .map_err(HookError::new)?;
        self.call(hook, &input)
    }
}

impl OnActivate for WasmPlugin {
    fn activate(&mut self) -> HookResult {
        self.call(HookKind::Activate, "").map(drop)
    }
}

impl OnDeactivate for WasmPlugin {
    fn deactivate(&mut self) -> HookResult {
        self.call(HookKind::Deactivate, "").map(drop)
    }
}

impl OnBeforeLoad for WasmPlugin {
    fn before_load(&mut self, channel: &mut dyn Channel, page: &mut dyn Page) -> HookResult {
        let output = self.call_with_page(HookKind::BeforeLoad, page)?;
        if output.trim().is_empty() {
            return Ok(());
        }

        let objects: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&output).map_err(|e| {
                HookError::msg(format!("before_load must return a JSON object: {e}"))
            })?;
        for (name, object) in objects {
            channel.register_object(&name, object);
        }
        Ok(())
    }
}

impl OnLoadStarted for WasmPlugin {
    fn load_started(&mut self, page: &mut dyn Page) -> HookResult {
        self.call_with_page(HookKind::LoadStarted, page).map(drop)
    }
}

impl OnLoadFinished for WasmPlugin {
    fn load_finished(&mut self, page: &mut dyn Page) -> HookResult {
        self.call_with_page(HookKind::LoadFinished, page).map(drop)
    }
}

impl Plugin for WasmPlugin {
    fn as_on_activate(&mut self) -> Option<&mut dyn OnActivate> {
        if self.hooks.contains(&HookKind::Activate) {
            Some(self)
        } else {
            None
        }
    }

    fn as_on_deactivate(&mut self) -> Option<&mut dyn OnDeactivate> {
        if self.hooks.contains(&HookKind::Deactivate) {
            Some(self)
        } else {
            None
        }
    }

    fn as_on_before_load(&mut self) -> Option<&mut dyn OnBeforeLoad> {
        if self.hooks.contains(&HookKind::BeforeLoad) {
            Some(self)
        } else {
            None
        }
    }

    fn as_on_load_started(&mut self) -> Option<&mut dyn OnLoadStarted> {
        if self.hooks.contains(&HookKind::LoadStarted) {
            Some(self)
        } else {
            None
        }
    }

    fn as_on_load_finished(&mut self) -> Option<&mut dyn OnLoadFinished> {
        if self.hooks.contains(&HookKind::LoadFinished) {
            Some(self)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for WasmPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmPlugin")
            .field("name", &self.name)
            .field("hooks", &self.hooks())
            .finish_non_exhaustive()
    }
}
