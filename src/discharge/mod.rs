//! Discharging carriers into concrete values.
//!
//! This module provides the program-boundary operations:
//! - [`matching`] - exhaustive (or catch-all) dispatch of a carrier's outcome
//! - [`partial`] - resolve selected error tags into values and narrow the metadata
//! - [`match_value`] - dispatch a plain value by tag, literal, kind or fallback
//! - [`Carrier::attempt`](crate::Carrier::attempt) - throw-style extraction
//!
//! A discharge of a pending carrier is itself pending; see [`Discharged`].

use std::fmt;
use std::future::IntoFuture;

use futures::future::BoxFuture;

mod matching;
mod partial;
mod value;

pub use matching::{matching, Arms, Match};
pub use partial::{partial, Partial, Recover};
pub use value::{match_value, Cases, Matchable, ValueMatch};

/// The result of discharging a carrier: available now, or after awaiting.
///
/// # Example
///
/// ```
/// use confluence::discharge::Discharged;
///
/// # tokio_test::block_on(async {
/// let now = Discharged::Ready(1);
/// assert_eq!(now.await, 1);
///
/// let later = Discharged::Pending(Box::pin(async { 2 }));
/// assert!(later.is_pending());
/// assert_eq!(later.await, 2);
/// # });
/// ```
pub enum Discharged<R> {
    /// The carrier was settled; here is the value.
    Ready(R),
    /// The carrier was pending; await for the value.
    Pending(BoxFuture<'static, R>),
}

impl<R> Discharged<R> {
    /// Whether awaiting is required.
    pub fn is_pending(&self) -> bool {
        matches!(self, Discharged::Pending(_))
    }

    /// The value if it is available now, otherwise `self` back.
    pub fn into_ready(self) -> Result<R, Self> {
        match self {
            Discharged::Ready(value) => Ok(value),
            pending => Err(pending),
        }
    }

    /// The value if it is available without awaiting.
    pub fn now(self) -> Option<R> {
        self.into_ready().ok()
    }

    /// Transform the eventual value.
    pub fn map<S, F>(self, f: F) -> Discharged<S>
    where
        R: Send + 'static,
        F: FnOnce(R) -> S + Send + 'static,
    {
        match self {
            Discharged::Ready(value) => Discharged::Ready(f(value)),
            Discharged::Pending(future) => {
                Discharged::Pending(Box::pin(async move { f(future.await) }))
            }
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Discharged<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discharged::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Discharged::Pending(_) => f.write_str("Pending(<future>)"),
        }
    }
}

impl<R: Send + 'static> IntoFuture for Discharged<R> {
    type Output = R;
    type IntoFuture = BoxFuture<'static, R>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Discharged::Ready(value) => Box::pin(futures::future::ready(value)),
            Discharged::Pending(future) => future,
        }
    }
}
