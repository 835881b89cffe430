//! Webshell Events - synchronous publish/subscribe for the webshell host.
//!
//! Every component that needs notification fan-out exposes one or more
//! [`Signal`]s parameterized by the payload type:
//!
//! - the settings store emits a `SettingChange` whenever a value changes
//! - the plugin manager emits the plugin name when a plugin is added,
//!   removed, activated or deactivated
//!
//! Emission is synchronous and ordered. There is no queue and no background
//! delivery: `emit` returns once every subscriber has run, or as soon as one
//! of them fails.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use webshell_events::Signal;
//!
//! let signal: Signal<String> = Signal::new("plugin-added");
//! let seen = Rc::new(Cell::new(0_usize));
//!
//! let counter = Rc::clone(&seen);
//! signal.subscribe(move |_name: &String| {
//!     counter.set(counter.get().saturating_add(1));
//!     Ok(())
//! });
//!
//! signal.emit(&"test".to_string()).unwrap();
//! assert_eq!(seen.get(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod signal;

pub use error::{HandlerError, HandlerResult, SignalError};
pub use signal::{Signal, SubscriberId};
