//! Testing utilities for code built on carriers
//!
//! Assertion macros that force a carrier and check its outcome or its metadata, plus
//! property-based testing support for [`EffectMetadata`](crate::EffectMetadata) behind
//! the `proptest` feature.
//!
//! # Examples
//!
//! ```rust
//! use confluence::{assert_declares, assert_err_tag, assert_ok, err, ok, Carrier, Defect};
//!
//! let good: Carrier<i32, Defect> = ok(42);
//! assert_ok!(good, 42);
//!
//! let bad: Carrier<i32, Defect> = err(Defect::UnknownException { cause: "boom".into() });
//! assert_declares!(bad, "UnknownException");
//! assert_err_tag!(bad, "UnknownException");
//! ```

/// Assert that a carrier settles successfully, optionally to an expected value.
///
/// Deferred carriers are forced first. A pending carrier fails the assertion; await it
/// with [`Carrier::settle`](crate::Carrier::settle) instead.
///
/// # Example
///
/// ```rust
/// use confluence::{assert_ok, ok, Carrier, Defect};
///
/// let carrier: Carrier<_, Defect> = ok("ready");
/// assert_ok!(carrier);
/// ```
#[macro_export]
macro_rules! assert_ok {
    ($carrier:expr) => {
        match $carrier.force().peek() {
            Some(Ok(_)) => {}
            Some(Err(e)) => panic!("Expected Ok, got Err: {:?}", e),
            None => panic!("Expected a settled carrier, got a pending one"),
        }
    };
    ($carrier:expr, $expected:expr) => {
        match $carrier.force().peek() {
            Some(Ok(value)) => assert_eq!(*value, $expected),
            Some(Err(e)) => panic!("Expected Ok({:?}), got Err: {:?}", $expected, e),
            None => panic!("Expected a settled carrier, got a pending one"),
        }
    };
}

/// Assert that a carrier settles to an error with the given tag.
///
/// # Example
///
/// ```rust
/// use confluence::{assert_err_tag, err, Carrier, Defect};
///
/// let carrier: Carrier<i32, _> = err(Defect::PromiseRejected { cause: "gone".into() });
/// assert_err_tag!(carrier, "PromiseRejected");
/// ```
#[macro_export]
macro_rules! assert_err_tag {
    ($carrier:expr, $tag:expr) => {
        match $carrier.force().peek() {
            Some(Err(e)) => assert_eq!($crate::Tagged::tag(e), $tag),
            Some(Ok(v)) => panic!("Expected Err tagged {:?}, got Ok: {:?}", $tag, v),
            None => panic!("Expected a settled carrier, got a pending one"),
        }
    };
}

/// Assert that a carrier's metadata declares every listed tag.
///
/// Only the metadata is inspected; the carrier is not forced.
///
/// # Example
///
/// ```rust
/// use confluence::{assert_declares, ok, Carrier, Defect, EffectMetadata};
///
/// let carrier: Carrier<i32, Defect> =
///     ok(1).merge_meta(&EffectMetadata::failing("A").with_variant("B"));
/// assert_declares!(carrier, "A", "B");
/// ```
#[macro_export]
macro_rules! assert_declares {
    ($carrier:expr, $($tag:expr),+ $(,)?) => {
        {
            let meta = $carrier.meta();
            $(
                if !meta.declares($tag) {
                    panic!("Expected metadata to declare {:?}, got {}", $tag, meta);
                }
            )+
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
use crate::meta::{EffectMetadata, Tag};

/// Tags drawn from by the `Arbitrary` impl for `EffectMetadata`.
#[cfg(feature = "proptest")]
pub const ARBITRARY_TAGS: &[Tag] = &["A", "B", "C", "Empty", "Timeout", "PromiseRejected"];

#[cfg(feature = "proptest")]
impl Arbitrary for EffectMetadata {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (
            any::<bool>(),
            prop::sample::subsequence(ARBITRARY_TAGS, 0..=ARBITRARY_TAGS.len()),
        )
            .prop_map(|(is_async, tags)| {
                let meta = tags
                    .into_iter()
                    .fold(EffectMetadata::new(), EffectMetadata::with_variant);
                if is_async {
                    meta.with_async()
                } else {
                    meta
                }
            })
            .boxed()
    }
}
