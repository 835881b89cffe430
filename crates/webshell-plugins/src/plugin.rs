//! Plugin trait and optional hook capabilities.
//!
//! A plugin opts into a hook by implementing the matching capability trait
//! and returning itself from the corresponding `as_on_*` accessor:
//!
//! ```rust
//! use webshell_plugins::{HookResult, OnActivate, Plugin};
//!
//! struct Greeter;
//!
//! impl OnActivate for Greeter {
//!     fn activate(&mut self) -> HookResult {
//!         tracing::info!("hello");
//!         Ok(())
//!     }
//! }
//!
//! impl Plugin for Greeter {
//!     fn as_on_activate(&mut self) -> Option<&mut dyn OnActivate> {
//!         Some(self)
//!     }
//! }
//! ```
//!
//! Hooks that are not exposed are skipped silently.

use crate::error::HookResult;
use crate::host::{Channel, Page};

/// Called when the plugin enters the active set.
pub trait OnActivate {
    /// Activate the plugin.
    ///
    /// # Errors
    ///
    /// An error leaves the plugin inactive.
    fn activate(&mut self) -> HookResult;
}

/// Called when the plugin leaves the active set.
pub trait OnDeactivate {
    /// Deactivate the plugin.
    ///
    /// # Errors
    ///
    /// The plugin is marked inactive even when this fails.
    fn deactivate(&mut self) -> HookResult;
}

/// Called once per page before navigation begins.
pub trait OnBeforeLoad {
    /// Prepare `page`, typically by registering objects on `channel`.
    ///
    /// # Errors
    ///
    /// An error stops delivery to later plugins for this event.
    fn before_load(&mut self, channel: &mut dyn Channel, page: &mut dyn Page) -> HookResult;
}

/// Called when a page starts loading.
pub trait OnLoadStarted {
    /// Handle the event.
    ///
    /// # Errors
    ///
    /// An error stops delivery to later plugins for this event.
    fn load_started(&mut self, page: &mut dyn Page) -> HookResult;
}

/// Called when a page finishes loading.
pub trait OnLoadFinished {
    /// Handle the event.
    ///
    /// # Errors
    ///
    /// An error stops delivery to later plugins for this event.
    fn load_finished(&mut self, page: &mut dyn Page) -> HookResult;
}

/// A loaded plugin module.
///
/// Every accessor defaults to `None`, so a plugin with no hooks at all is
/// valid and can still be enabled and disabled.
pub trait Plugin {
    /// The activate capability, if implemented.
    fn as_on_activate(&mut self) -> Option<&mut dyn OnActivate> {
        None
    }

    /// The deactivate capability, if implemented.
    fn as_on_deactivate(&mut self) -> Option<&mut dyn OnDeactivate> {
        None
    }

    /// The before-load capability, if implemented.
    fn as_on_before_load(&mut self) -> Option<&mut dyn OnBeforeLoad> {
        None
    }

    /// The load-started capability, if implemented.
    fn as_on_load_started(&mut self) -> Option<&mut dyn OnLoadStarted> {
        None
    }

    /// The load-finished capability, if implemented.
    fn as_on_load_finished(&mut self) -> Option<&mut dyn OnLoadFinished> {
        None
    }
}

impl std::fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin").finish_non_exhaustive()
    }
}
