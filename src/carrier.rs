//! The carrier: one wrapper for success, failure and asynchrony
//!
//! A [`Carrier<A, E>`] pairs a [`Payload`] with the [`EffectMetadata`] accumulated while
//! producing it. The payload is in exactly one of three explicit states:
//!
//! - `Settled(Ok | Err)`: a value is available now
//! - `Pending(future)`: resolves exactly once into `Ok` or `Err`
//! - `Deferred(lazy)`: nothing has run yet; forcing yields another carrier
//!
//! Every consumer branches on the state. Nothing ever pretends a pending payload is a
//! settled one.
//!
//! # Examples
//!
//! ```
//! use confluence::{err, ok, Carrier, Tagged};
//!
//! #[derive(Debug, PartialEq)]
//! struct NotFound;
//!
//! impl Tagged for NotFound {
//!     fn tag(&self) -> &'static str {
//!         "NotFound"
//!     }
//!
//!     fn variants() -> &'static [&'static str] {
//!         &["NotFound"]
//!     }
//! }
//!
//! let found: Carrier<i32, NotFound> = ok(1);
//! assert!(found.meta().is_empty());
//!
//! let missing: Carrier<i32, NotFound> = err(NotFound);
//! assert!(missing.meta().declares("NotFound"));
//! assert_eq!(missing.peek(), Some(&Err(NotFound)));
//! ```

use std::fmt;
use std::future::{Future, IntoFuture};

use futures::future::BoxFuture;

use crate::discharge::Discharged;
use crate::lazy::Lazy;
use crate::meta::EffectMetadata;
use crate::tagged::{Fail, Tagged};
use crate::Semigroup;

/// The state of a carrier's value.
pub enum Payload<A, E> {
    /// Available now.
    Settled(Result<A, E>),
    /// Settles exactly once when awaited.
    Pending(BoxFuture<'static, Result<A, E>>),
    /// Not yet evaluated. Forcing produces the next carrier.
    Deferred(Box<Lazy<Carrier<A, E>>>),
}

impl<A: fmt::Debug, E: fmt::Debug> fmt::Debug for Payload<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Settled(result) => f.debug_tuple("Settled").field(result).finish(),
            Payload::Pending(_) => f.write_str("Pending(<future>)"),
            Payload::Deferred(_) => f.write_str("Deferred(<lazy>)"),
        }
    }
}

/// A success/failure payload plus its effect metadata.
pub struct Carrier<A, E> {
    payload: Payload<A, E>,
    meta: EffectMetadata,
}

impl<A: fmt::Debug, E: fmt::Debug> fmt::Debug for Carrier<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carrier")
            .field("payload", &self.payload)
            .field("meta", &self.meta)
            .finish()
    }
}

impl<A, E> Carrier<A, E> {
    /// A settled success with empty metadata.
    pub fn ok(value: A) -> Self {
        Carrier {
            payload: Payload::Settled(Ok(value)),
            meta: EffectMetadata::new(),
        }
    }

    /// Assemble a carrier from its parts.
    pub fn from_parts(payload: Payload<A, E>, meta: EffectMetadata) -> Self {
        Carrier { payload, meta }
    }

    /// Split into payload and metadata.
    pub fn into_parts(self) -> (Payload<A, E>, EffectMetadata) {
        (self.payload, self.meta)
    }

    /// The accumulated metadata.
    pub fn meta(&self) -> &EffectMetadata {
        &self.meta
    }

    /// The payload state.
    pub fn payload(&self) -> &Payload<A, E> {
        &self.payload
    }

    /// Whether the payload is waiting on asynchronous work.
    pub fn is_pending(&self) -> bool {
        matches!(self.payload, Payload::Pending(_))
    }

    /// Whether the payload has not been evaluated yet.
    pub fn is_deferred(&self) -> bool {
        matches!(self.payload, Payload::Deferred(_))
    }

    /// The result, if it is available without awaiting or forcing.
    pub fn peek(&self) -> Option<&Result<A, E>> {
        match &self.payload {
            Payload::Settled(result) => Some(result),
            _ => None,
        }
    }

    /// Merge additional metadata into this carrier's record.
    pub fn merge_meta(mut self, extra: &EffectMetadata) -> Self {
        self.meta = self.meta.combine(extra.clone());
        self
    }

    /// The raw value of a settled success that carries no effect metadata.
    ///
    /// This is the "stays plain" fast path: a wrapped call whose inputs and handler were
    /// all non-effectful yields exactly such a carrier. Anything else is returned
    /// unchanged in `Err`.
    ///
    /// ```
    /// use confluence::{lift, Carrier, Defect};
    ///
    /// let add = lift(|a: i32, b: i32| a + b);
    /// let sum: Carrier<i32, Defect> = add.call((1, 2));
    /// assert_eq!(sum.try_plain().ok(), Some(3));
    /// ```
    pub fn try_plain(self) -> Result<A, Self> {
        if !self.meta.is_empty() {
            return Err(self);
        }
        match self.payload {
            Payload::Settled(Ok(value)) => Ok(value),
            payload => Err(Carrier {
                payload,
                meta: self.meta,
            }),
        }
    }
}

impl<A, E: Tagged> Carrier<A, E> {
    /// A settled failure whose metadata declares the error's tag.
    pub fn err(error: E) -> Self {
        let meta = EffectMetadata::failing(error.tag());
        Carrier {
            payload: Payload::Settled(Err(error)),
            meta,
        }
    }

    /// Lift a `Result`, declaring the error's tag on failure.
    pub fn from_result(result: Result<A, E>) -> Self {
        match result {
            Ok(value) => Carrier::ok(value),
            Err(error) => Carrier::err(error),
        }
    }
}

impl<A, E> Carrier<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    /// A pending carrier over `future`, marked asynchronous.
    ///
    /// The future may settle into any variant of `E`, so all of them are declared.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<A, E>> + Send + 'static,
        E: Tagged,
    {
        Carrier {
            payload: Payload::Pending(Box::pin(future)),
            meta: EffectMetadata::variants_of::<E>().with_async(),
        }
    }

    /// A carrier whose evaluation waits until it is forced.
    ///
    /// `meta` is what is known before forcing; the forced carrier's own metadata is
    /// merged in when it is produced.
    pub fn deferred(thunk: Lazy<Carrier<A, E>>, meta: EffectMetadata) -> Self {
        Carrier {
            payload: Payload::Deferred(Box::new(thunk)),
            meta,
        }
    }

    /// Force deferred layers until the payload is settled or pending.
    pub fn force(self) -> Self {
        let (discharged, meta) = self.undefer();
        let payload = match discharged {
            Discharged::Ready(result) => Payload::Settled(result),
            Discharged::Pending(future) => Payload::Pending(future),
        };
        Carrier { payload, meta }
    }

    /// Force and await, yielding the final result.
    pub async fn settle(self) -> Result<A, E> {
        self.undefer().0.await
    }

    /// Throw-style extraction for program boundaries.
    ///
    /// Yields the result immediately when the carrier is settled, or a pending
    /// [`Discharged`] otherwise. Combine with `?` after awaiting.
    pub fn attempt(self) -> Discharged<Result<A, E>> {
        self.undefer().0
    }

    /// Transform the success value. Failures pass through untouched.
    pub fn map<B, F>(self, f: F) -> Carrier<B, E>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        let payload = match self.payload {
            Payload::Settled(result) => Payload::Settled(result.map(f)),
            Payload::Pending(future) => {
                Payload::Pending(Box::pin(async move { future.await.map(f) }))
            }
            Payload::Deferred(thunk) => Payload::Deferred(Box::new((*thunk).map(move |c| c.map(f)))),
        };
        Carrier {
            payload,
            meta: self.meta,
        }
    }

    /// Transform the error value.
    ///
    /// A settled failure records its new tag. An unsettled carrier that may fail
    /// declares every variant of `E2`, since the mapped tag is not known yet.
    pub fn map_err<E2, F>(self, f: F) -> Carrier<A, E2>
    where
        E2: Tagged + Send + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        let mut meta = self.meta;
        if !matches!(self.payload, Payload::Settled(_)) && !meta.error_variants().is_empty() {
            meta = meta.combine(EffectMetadata::variants_of::<E2>());
        }
        let payload = match self.payload {
            Payload::Settled(Ok(value)) => Payload::Settled(Ok(value)),
            Payload::Settled(Err(error)) => {
                let mapped = f(error);
                meta = meta.with_variant(mapped.tag());
                Payload::Settled(Err(mapped))
            }
            Payload::Pending(future) => {
                Payload::Pending(Box::pin(async move { future.await.map_err(f) }))
            }
            Payload::Deferred(thunk) => {
                Payload::Deferred(Box::new((*thunk).map(move |c| c.map_err(f))))
            }
        };
        Carrier { payload, meta }
    }

    /// Attach a tracing span to the pending work of this carrier.
    ///
    /// The span is entered each time the pending future is polled. Settled carriers are
    /// returned unchanged.
    pub fn instrument(self, span: tracing::Span) -> Self {
        use tracing::Instrument as _;

        let payload = match self.payload {
            Payload::Pending(future) => Payload::Pending(Box::pin(future.instrument(span))),
            Payload::Deferred(thunk) => {
                Payload::Deferred(Box::new((*thunk).map(move |c| c.instrument(span))))
            }
            settled => settled,
        };
        Carrier {
            payload,
            meta: self.meta,
        }
    }

    /// Resolve every deferred layer, merging each layer's metadata.
    fn undefer(self) -> (Discharged<Result<A, E>>, EffectMetadata) {
        let mut meta = self.meta;
        let mut payload = self.payload;
        loop {
            payload = match payload {
                Payload::Settled(result) => return (Discharged::Ready(result), meta),
                Payload::Pending(future) => return (Discharged::Pending(future), meta),
                Payload::Deferred(thunk) => {
                    let next = (*thunk).into_value();
                    meta = meta.combine(next.meta);
                    next.payload
                }
            };
        }
    }
}

impl<A, E> Carrier<Carrier<A, E>, E>
where
    A: Send + 'static,
    E: Tagged + Send + 'static,
{
    /// Collapse a nested carrier into one layer, merging both metadata records.
    ///
    /// When the outer layer is pending the inner metadata is not visible yet, and every
    /// variant of `E` is declared in its place.
    pub fn flatten(self) -> Carrier<A, E> {
        let meta = self.meta;
        match self.payload {
            Payload::Settled(Ok(inner)) => inner.merge_meta(&meta),
            Payload::Settled(Err(error)) => Carrier {
                payload: Payload::Settled(Err(error)),
                meta,
            },
            Payload::Pending(future) => Carrier {
                payload: Payload::Pending(Box::pin(async move {
                    match future.await {
                        Ok(inner) => inner.settle().await,
                        Err(error) => Err(error),
                    }
                })),
                meta: meta.combine(EffectMetadata::variants_of::<E>()),
            },
            Payload::Deferred(thunk) => Carrier {
                payload: Payload::Deferred(Box::new((*thunk).map(Carrier::flatten))),
                meta,
            },
        }
    }
}

impl<A, E> IntoFuture for Carrier<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    type Output = Result<A, E>;
    type IntoFuture = BoxFuture<'static, Result<A, E>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.settle())
    }
}

impl<A, E: Tagged> From<Fail<E>> for Carrier<A, E> {
    fn from(marker: Fail<E>) -> Self {
        Carrier::err(marker.into_error())
    }
}

/// Build a success carrier.
pub fn ok<A, E>(value: A) -> Carrier<A, E> {
    Carrier::ok(value)
}

/// Build a failure carrier declaring the error's tag.
pub fn err<A, E: Tagged>(error: E) -> Carrier<A, E> {
    Carrier::err(error)
}
