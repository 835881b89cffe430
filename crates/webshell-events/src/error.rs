//! Signal error types.

use std::error::Error as StdError;
use std::fmt;

use crate::signal::SubscriberId;

/// Error returned by a subscriber to abort the current emission.
///
/// Wraps any error type so that subscribers in different crates can report
/// their own failures without the signal knowing about them.
pub struct HandlerError(Box<dyn StdError + Send + Sync + 'static>);

impl HandlerError {
    /// Wrap an existing error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Box::new(error))
    }

    /// Create an error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    /// Borrow the wrapped error.
    #[must_use]
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Attempt to recover the concrete error type.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if the wrapped error is not an `E`.
    pub fn downcast<E>(self) -> Result<E, Self>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.0.downcast::<E>().map(|e| *e).map_err(Self)
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for HandlerError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Result type returned by signal subscribers.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors produced while emitting a signal.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// A subscriber failed; subscribers registered after it were not invoked.
    #[error("subscriber {subscriber} of signal '{signal}' failed: {source}")]
    HandlerFailed {
        /// Name of the signal being emitted.
        signal: String,
        /// The failing subscriber.
        subscriber: SubscriberId,
        /// The subscriber's error.
        #[source]
        source: HandlerError,
    },
}

impl SignalError {
    /// The subscriber's own error.
    #[must_use]
    pub fn handler_error(&self) -> &HandlerError {
        match self {
            Self::HandlerFailed { source, .. } => source,
        }
    }

    /// Consume the signal error and return the subscriber's error.
    #[must_use]
    pub fn into_handler_error(self) -> HandlerError {
        match self {
            Self::HandlerFailed { source, .. } => source,
        }
    }
}
