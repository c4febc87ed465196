//! What a handler may return.

use crate::carrier::Carrier;
use crate::lazy::Lazy;
use crate::meta::EffectMetadata;
use crate::tagged::Tagged;

/// A handler result the combinator knows how to re-wrap.
///
/// - `Result<A, E>`: `Ok` is a success, `Err` a failure whose tag is recorded. A
///   [`Fail`](crate::Fail) marker converts into the `Err` side with `.into()`.
/// - `Carrier<A, E>`: adopted as is, never nested.
/// - `Lazy<O>`: the laziness is kept; nothing is evaluated until the carrier is forced.
/// - [`Pure<A>`]: an always-successful value.
pub trait Outcome<E>: Send + 'static {
    /// The success type of the resulting carrier.
    type Value: Send + 'static;

    /// Re-wrap as a carrier.
    fn into_carrier(self) -> Carrier<Self::Value, E>;

    /// Error variants an outcome of this type may carry, known before one is produced.
    fn variants() -> EffectMetadata;
}

impl<A, E> Outcome<E> for Carrier<A, E>
where
    A: Send + 'static,
    E: Tagged + Send + 'static,
{
    type Value = A;

    fn into_carrier(self) -> Carrier<A, E> {
        self
    }

    fn variants() -> EffectMetadata {
        EffectMetadata::variants_of::<E>()
    }
}

impl<A, E> Outcome<E> for Result<A, E>
where
    A: Send + 'static,
    E: Tagged + Send + 'static,
{
    type Value = A;

    fn into_carrier(self) -> Carrier<A, E> {
        Carrier::from_result(self)
    }

    fn variants() -> EffectMetadata {
        EffectMetadata::variants_of::<E>()
    }
}

impl<O, E> Outcome<E> for Lazy<O>
where
    O: Outcome<E>,
    E: Send + 'static,
{
    type Value = O::Value;

    fn into_carrier(self) -> Carrier<O::Value, E> {
        Carrier::deferred(self.map(Outcome::into_carrier), O::variants())
    }

    fn variants() -> EffectMetadata {
        O::variants()
    }
}

/// A plain value returned from a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pure<A>(pub A);

impl<A, E> Outcome<E> for Pure<A>
where
    A: Send + 'static,
    E: Send + 'static,
{
    type Value = A;

    fn into_carrier(self) -> Carrier<A, E> {
        Carrier::ok(self.0)
    }

    fn variants() -> EffectMetadata {
        EffectMetadata::new()
    }
}
