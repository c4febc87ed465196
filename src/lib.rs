//! # Confluence
//!
//! Plain functions over plain values, applied to values that may have failed, may still
//! be running, or may not be computed yet.
//!
//! ## The idea
//!
//! A [`Carrier`] holds a value together with what is known about how it was produced:
//! whether asynchronous work was involved and which error variants may surface. Handlers
//! are written against plain values and wrapped once with [`wrap`] (or [`lift`],
//! [`wrap_async`], [`wrap_variadic`]). A wrapped handler accepts plain values, carriers,
//! [`Lazy`] thunks and futures in any mix:
//!
//! - all plain: the handler just runs;
//! - any failure: the handler is skipped and the first failure, by argument position,
//!   flows through;
//! - anything pending: the result is pending;
//! - anything lazy: nothing runs until the result is forced.
//!
//! The metadata of every result is the union of its inputs' metadata, so at the edge of
//! the program [`matching`] can insist on a handler for every error variant that may
//! occur, and [`partial`] can drain a few variants while passing the rest along.
//!
//! ## Quick Example
//!
//! ```rust
//! use confluence::{lift, matching, ok, Arms, Carrier, Defect};
//!
//! let add = lift(|a: i32, b: i32| a + b);
//!
//! // One input is already a carrier; the handler never has to unwrap it.
//! let sum: Carrier<i32, Defect> = add.call((ok(1), 2));
//!
//! let message = matching(sum)
//!     .with(Arms::ok(|n: i32| format!("sum is {}", n)).err(|e| format!("failed: {}", e)))
//!     .now();
//! assert_eq!(message.as_deref(), Some("sum is 3"));
//! ```
//!
//! ## Features
//!
//! - `async` (default): [`RemoteValue`] and its [`Registry`], built on tokio.
//! - `serde`: `Serialize` for [`EffectMetadata`], [`Matchable`] for `serde_json::Value`.
//! - `proptest`: `Arbitrary` for [`EffectMetadata`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod carrier;
pub mod combinator;
pub mod defect;
pub mod discharge;
pub mod lazy;
pub mod meta;
pub mod monoid;
#[cfg(feature = "async")]
pub mod remote;
pub mod semigroup;
pub mod tagged;
pub mod testing;

// Re-exports
pub use carrier::{err, ok, Carrier, Payload};
pub use combinator::{
    lift, wrap, wrap_async, wrap_variadic, Arg, Handler, Outcome, Pure, WrapOptions, Wrapped,
};
pub use defect::{Cause, Defect, PROMISE_REJECTED, UNKNOWN_EXCEPTION};
pub use discharge::{
    match_value, matching, partial, Arms, Cases, Discharged, Matchable, Recover,
};
pub use lazy::{lazy, lazy_call, Lazy};
pub use meta::{merge_all, EffectMetadata, Tag};
pub use monoid::Monoid;
#[cfg(feature = "async")]
pub use remote::{Registry, RemoteError, RemoteId, RemoteOptions, RemoteValue};
pub use semigroup::Semigroup;
pub use tagged::{fail, Fail, Tagged};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::carrier::{err, ok, Carrier};
    pub use crate::combinator::{lift, wrap, wrap_async, wrap_variadic, Arg, Pure, WrapOptions};
    pub use crate::defect::{Cause, Defect};
    pub use crate::discharge::{match_value, matching, partial, Arms, Cases, Recover};
    pub use crate::lazy::{lazy, Lazy};
    pub use crate::meta::EffectMetadata;
    pub use crate::monoid::Monoid;
    #[cfg(feature = "async")]
    pub use crate::remote::{Registry, RemoteOptions, RemoteValue};
    pub use crate::semigroup::Semigroup;
    pub use crate::tagged::{fail, Tagged};
}
