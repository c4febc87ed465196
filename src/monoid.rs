//! Monoid trait for types with identity elements
//!
//! A `Monoid` extends `Semigroup` by adding an identity element. The empty
//! [`EffectMetadata`](crate::EffectMetadata) record is the identity of the metadata
//! algebra, which lets any number of argument records be folded without a seed.
//!
//! # Mathematical Properties
//!
//! 1. **Associativity** (from Semigroup)
//! 2. **Right Identity**: `a.combine(M::empty()) == a`
//! 3. **Left Identity**: `M::empty().combine(a) == a`
//!
//! # Examples
//!
//! ```
//! use confluence::monoid::{fold_all, Any};
//!
//! let flags = vec![Any(false), Any(true), Any(false)];
//! assert_eq!(fold_all(flags), Any(true));
//! ```

use crate::Semigroup;
use std::collections::BTreeSet;

/// A `Monoid` is a `Semigroup` with an identity element.
///
/// # Laws
///
/// ```text
/// a.combine(M::empty()) == a           (right identity)
/// M::empty().combine(a) == a           (left identity)
/// ```
pub trait Monoid: Semigroup {
    /// The identity element for this monoid.
    fn empty() -> Self;
}

/// Monoid for BTreeSet - empty set is identity
impl<T> Monoid for BTreeSet<T>
where
    T: Ord,
{
    fn empty() -> Self {
        BTreeSet::new()
    }
}

/// Boolean monoid under logical or.
///
/// Identity: `false`. This is how the `async` fact of effect metadata merges: a
/// composition is asynchronous as soon as any part of it is.
///
/// # Example
///
/// ```
/// use confluence::monoid::Any;
/// use confluence::{Monoid, Semigroup};
///
/// assert_eq!(Any(true).combine(Any::empty()), Any(true));
/// assert_eq!(Any(false).combine(Any(false)), Any(false));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Any(pub bool);

impl Semigroup for Any {
    #[inline]
    fn combine(self, other: Self) -> Self {
        Any(self.0 || other.0)
    }
}

impl Monoid for Any {
    fn empty() -> Self {
        Any(false)
    }
}

/// Fold all values in an iterator using the Monoid instance.
///
/// Returns `M::empty()` for an empty iterator.
///
/// # Example
///
/// ```
/// use confluence::monoid::{fold_all, Any};
///
/// assert_eq!(fold_all(vec![Any(false), Any(true)]), Any(true));
/// assert_eq!(fold_all(Vec::<Any>::new()), Any(false));
/// ```
pub fn fold_all<M, I>(iter: I) -> M
where
    M: Monoid,
    I: IntoIterator<Item = M>,
{
    iter.into_iter().fold(M::empty(), |acc, x| acc.combine(x))
}
