//! Typed signal with ordered synchronous subscribers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{HandlerResult, SignalError};

/// Registration handle for a subscriber.
///
/// Every call to [`Signal::subscribe`] yields a fresh id, even when the same
/// closure is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

type Handler<T> = Rc<RefCell<dyn FnMut(&T) -> HandlerResult>>;

struct Subscription<T> {
    id: SubscriberId,
    handler: Handler<T>,
}

/// A named event that any number of subscribers can listen to.
///
/// Subscribers run synchronously, in registration order, on the thread that
/// calls [`emit`](Self::emit). The first subscriber returning an error stops
/// the emission and the error is handed back to the emitter.
///
/// The subscriber list is snapshotted when an emission starts: subscribers
/// added from inside a handler only see later emissions, and subscribers
/// removed from inside a handler are not invoked for the rest of the current
/// one.
pub struct Signal<T> {
    name: String,
    subscribers: RefCell<Vec<Subscription<T>>>,
}

impl<T: 'static> Signal<T> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// The signal name, used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a subscriber.
    ///
    /// No de-duplication is performed.
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: FnMut(&T) -> HandlerResult + 'static,
    {
        let id = SubscriberId::new();
        let handler: Handler<T> = Rc::new(RefCell::new(handler));
        self.subscribers
            .borrow_mut()
            .push(Subscription { id, handler });
        debug!(signal = %self.name, subscriber = %id, "Subscriber registered");
        id
    }

    /// Remove a subscriber.
    ///
    /// Returns `true` if the subscriber was registered. Removing an unknown
    /// subscriber only logs a warning.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subs = self.subscribers.borrow_mut();
        if let Some(pos) = subs.iter().position(|s| s.id == id) {
            subs.remove(pos);
            debug!(signal = %self.name, subscriber = %id, "Subscriber unregistered");
            true
        } else {
            warn!(
                signal = %self.name,
                subscriber = %id,
                "Subscriber not removed: not registered on this signal"
            );
            false
        }
    }

    /// Invoke every subscriber with `payload`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::HandlerFailed`] for the first subscriber that
    /// fails. Subscribers after it are not invoked.
    pub fn emit(&self, payload: &T) -> Result<(), SignalError> {
        let snapshot: Vec<(SubscriberId, Handler<T>)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|s| (s.id, Rc::clone(&s.handler)))
            .collect();

        trace!(signal = %self.name, subscribers = snapshot.len(), "Emitting signal");

        for (id, handler) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            let Ok(mut call) = handler.try_borrow_mut() else {
                warn!(
                    signal = %self.name,
                    subscriber = %id,
                    "Re-entrant emission skipped for subscriber already running"
                );
                continue;
            };
            if let Err(source) = (&mut *call)(payload) {
                return Err(SignalError::HandlerFailed {
                    signal: self.name.clone(),
                    subscriber: id,
                    source,
                });
            }
        }

        Ok(())
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.borrow().iter().any(|s| s.id == id)
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Whether no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Remove every subscriber.
    pub fn clear(&self) {
        self.subscribers.borrow_mut().clear();
        debug!(signal = %self.name, "All subscribers cleared");
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.subscribers.try_borrow().map(|s| s.len()).ok();
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("subscriber_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use std::cell::Cell;

    fn recorder(
        log: Rc<RefCell<Vec<String>>>,
        tag: &'static str,
    ) -> impl FnMut(&u32) -> HandlerResult {
        move |value: &u32| {
            log.borrow_mut().push(format!("{tag}:{value}"));
            Ok(())
        }
    }

    #[test]
    fn test_emit_in_registration_order() {
        let signal = Signal::new("order");
        let log = Rc::new(RefCell::new(Vec::new()));

        signal.subscribe(recorder(Rc::clone(&log), "a"));
        signal.subscribe(recorder(Rc::clone(&log), "b"));
        signal.subscribe(recorder(Rc::clone(&log), "c"));

        signal.emit(&7).unwrap();
        assert_eq!(*log.borrow(), vec!["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn test_same_handler_twice_runs_twice() {
        let signal = Signal::new("dup");
        let count = Rc::new(Cell::new(0_u32));

        let handler = {
            let count = Rc::clone(&count);
            move |_: &u32| {
                count.set(count.get().saturating_add(1));
                Ok(())
            }
        };
        signal.subscribe(handler.clone());
        signal.subscribe(handler);

        signal.emit(&1).unwrap();
        assert_eq!(count.get(), 2);
        assert_eq!(signal.len(), 2);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_registration() {
        let signal = Signal::new("unsub");
        let log = Rc::new(RefCell::new(Vec::new()));

        let a = signal.subscribe(recorder(Rc::clone(&log), "a"));
        signal.subscribe(recorder(Rc::clone(&log), "b"));

        assert!(signal.unsubscribe(a));
        signal.emit(&2).unwrap();
        assert_eq!(*log.borrow(), vec!["b:2"]);
    }

    #[test]
    fn test_unsubscribe_unknown_is_not_fatal() {
        let signal: Signal<u32> = Signal::new("unknown");
        let other: Signal<u32> = Signal::new("other");
        let id = other.subscribe(|_| Ok(()));

        assert!(!signal.unsubscribe(id));
        assert!(signal.is_empty());
    }

    #[test]
    fn test_first_failure_aborts_remaining() {
        let signal = Signal::new("abort");
        let log = Rc::new(RefCell::new(Vec::new()));

        signal.subscribe(recorder(Rc::clone(&log), "a"));
        let failing = signal.subscribe(|_: &u32| Err(HandlerError::msg("boom")));
        signal.subscribe(recorder(Rc::clone(&log), "c"));

        let err = signal.emit(&3).unwrap_err();
        assert_eq!(*log.borrow(), vec!["a:3"]);

        let SignalError::HandlerFailed {
            signal: name,
            subscriber,
            source,
        } = err;
        assert_eq!(name, "abort");
        assert_eq!(subscriber, failing);
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn test_subscriber_added_during_emit_not_invoked() {
        let signal = Rc::new(Signal::new("late"));
        let late_calls = Rc::new(Cell::new(0_u32));

        {
            let signal_ref = Rc::downgrade(&signal);
            let late_calls = Rc::clone(&late_calls);
            signal.subscribe(move |_: &u32| {
                if let Some(sig) = signal_ref.upgrade() {
                    let late_calls = Rc::clone(&late_calls);
                    sig.subscribe(move |_: &u32| {
                        late_calls.set(late_calls.get().saturating_add(1));
                        Ok(())
                    });
                }
                Ok(())
            });
        }

        signal.emit(&1).unwrap();
        assert_eq!(late_calls.get(), 0);
        assert_eq!(signal.len(), 2);

        signal.emit(&2).unwrap();
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn test_reentrant_emit_skips_running_subscriber() {
        let signal = Rc::new(Signal::new("reentrant"));
        let depth = Rc::new(Cell::new(0_u32));

        {
            let weak = Rc::downgrade(&signal);
            let depth = Rc::clone(&depth);
            signal.subscribe(move |value: &u32| {
                depth.set(depth.get().saturating_add(1));
                if *value == 0 {
                    if let Some(sig) = weak.upgrade() {
                        sig.emit(&1).map_err(HandlerError::new)?;
                    }
                }
                Ok(())
            });
        }

        signal.emit(&0).unwrap();
        assert_eq!(depth.get(), 1);
    }

    #[test]
    fn test_handler_error_downcast() {
        #[derive(Debug, thiserror::Error)]
        #[error("custom failure")]
        struct Custom;

        let err = HandlerError::new(Custom);
        assert_eq!(err.to_string(), "custom failure");
        assert!(err.downcast::<Custom>().is_ok());
    }

    #[test]
    fn test_clear() {
        let signal: Signal<u32> = Signal::new("clear");
        signal.subscribe(|_| Ok(()));
        signal.subscribe(|_| Ok(()));
        assert_eq!(signal.len(), 2);

        signal.clear();
        assert!(signal.is_empty());
        signal.emit(&0).unwrap();
    }
}
