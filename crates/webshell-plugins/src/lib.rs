//! Webshell Plugins - discovery, lifecycle and page-event dispatch.
//!
//! The pieces, leaves first:
//!
//! - [`PluginDescriptor`]: identity read from a `*.plugin` TOML file
//! - [`DescriptorStore`] / [`scan`]: recursive descriptor discovery
//! - [`PluginLoader`]: turns a descriptor into a [`Plugin`]
//!   ([`WasmLoader`] for Extism modules, [`BuiltinLoader`] for compiled-in
//!   plugins)
//! - [`PluginRegistry`]: loaded plugins, their resources and the active set
//! - [`PluginManager`]: load/activate/deactivate driven by
//!   `plugins.<name>.enabled`, plus page-event fan-out
//!
//! Plugins opt into hooks through the capability traits [`OnActivate`],
//! [`OnDeactivate`], [`OnBeforeLoad`], [`OnLoadStarted`] and
//! [`OnLoadFinished`]. A plugin without hooks is still valid.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use webshell_config::Settings;
//! use webshell_plugins::{DescriptorStore, PluginManager, WasmLoader};
//!
//! let mut settings = Settings::open("webshell.toml").unwrap();
//! let store = DescriptorStore::new(["/usr/share/webshell/plugins"], "wasm");
//! let manager = Rc::new(RefCell::new(PluginManager::new(store, WasmLoader::new())));
//!
//! PluginManager::watch_settings(&manager, &settings);
//! let report = manager.borrow_mut().scan_and_load(&mut settings);
//! println!("{} plugins active", report.activated.len());
//!
//! // Later, toggling the flag disables the plugin through the watcher.
//! settings.set("plugins.test.enabled", false).unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod descriptor;
pub mod discovery;
mod dispatch;
pub mod error;
pub mod host;
pub mod loader;
pub mod manager;
pub mod plugin;
pub mod registry;
pub mod wasm;

pub use descriptor::PluginDescriptor;
pub use discovery::{DescriptorStore, ScanResult, scan};
pub use error::{
    DescriptorError, DescriptorResult, HookError, HookKind, HookResult, PluginError, PluginResult,
};
pub use host::{Channel, InjectionPoint, Page, ResourceKind};
pub use loader::{BuiltinLoader, PluginFactory, PluginLoader};
pub use manager::{
    ManagerEvents, PluginManager, PluginStatus, ScanReport, enabled_key, plugin_name_from_key,
};
pub use plugin::{OnActivate, OnBeforeLoad, OnDeactivate, OnLoadFinished, OnLoadStarted, Plugin};
pub use registry::{PluginRegistry, PluginRuntimeEntry, PluginState};
pub use wasm::{WasmLoader, WasmPlugin};
