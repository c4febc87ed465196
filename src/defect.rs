//! Defects synthesized by the runtime
//!
//! A defect is an error that no handler declared: a wrapped handler panicked while it was
//! being invoked ([`Defect::UnknownException`]) or a pending input, or the handler's own
//! future, failed while being awaited ([`Defect::PromiseRejected`]). Both carry the
//! original [`Cause`] and both travel through the ordinary error channel, so a chain's
//! error type must be able to hold them (`E: From<Defect>`) unless the wrap options map
//! them elsewhere.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::meta::Tag;
use crate::tagged::Tagged;

/// Tag of [`Defect::PromiseRejected`].
pub const PROMISE_REJECTED: Tag = "PromiseRejected";

/// Tag of [`Defect::UnknownException`].
pub const UNKNOWN_EXCEPTION: Tag = "UnknownException";

/// The original reason behind a defect or a rejected settlement.
///
/// # Examples
///
/// ```
/// use confluence::Cause;
///
/// let cause = Cause::new("connection reset");
/// assert_eq!(cause.message(), "connection reset");
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// let cause = Cause::from_error(io);
/// assert_eq!(cause.to_string(), "disk full");
/// ```
#[derive(Clone)]
pub struct Cause {
    message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl Cause {
    /// A cause described only by a message.
    pub fn new(message: impl Into<String>) -> Self {
        Cause {
            message: message.into(),
            source: None,
        }
    }

    /// A cause wrapping an error value.
    pub fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Cause {
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// A cause recovered from a panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };
        Cause::new(message)
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cause")
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(|_| "<error>"))
            .finish()
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Cause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// Equality is by message: sources are opaque.
impl PartialEq for Cause {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for Cause {}

impl From<&str> for Cause {
    fn from(message: &str) -> Self {
        Cause::new(message)
    }
}

impl From<String> for Cause {
    fn from(message: String) -> Self {
        Cause::new(message)
    }
}

/// An error synthesized by the combinator runtime.
///
/// # Examples
///
/// ```
/// use confluence::{Cause, Defect, Tagged};
///
/// let defect = Defect::UnknownException { cause: Cause::new("index out of bounds") };
/// assert_eq!(defect.tag(), "UnknownException");
/// assert_eq!(defect.to_string(), "handler panicked: index out of bounds");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// An awaited source (input or the handler's own future) failed.
    PromiseRejected {
        /// Why it failed.
        cause: Cause,
    },
    /// The handler panicked while being invoked.
    UnknownException {
        /// The panic message.
        cause: Cause,
    },
}

impl Defect {
    /// The original cause.
    pub fn cause(&self) -> &Cause {
        match self {
            Defect::PromiseRejected { cause } | Defect::UnknownException { cause } => cause,
        }
    }

    /// Returns true for [`Defect::PromiseRejected`].
    pub fn is_rejection(&self) -> bool {
        matches!(self, Defect::PromiseRejected { .. })
    }
}

impl Tagged for Defect {
    fn tag(&self) -> Tag {
        match self {
            Defect::PromiseRejected { .. } => PROMISE_REJECTED,
            Defect::UnknownException { .. } => UNKNOWN_EXCEPTION,
        }
    }

    fn variants() -> &'static [Tag] {
        &[PROMISE_REJECTED, UNKNOWN_EXCEPTION]
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::PromiseRejected { cause } => write!(f, "awaited value rejected: {}", cause),
            Defect::UnknownException { cause } => write!(f, "handler panicked: {}", cause),
        }
    }
}

impl StdError for Defect {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause())
    }
}
