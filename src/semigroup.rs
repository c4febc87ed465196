//! Semigroup trait for associative merges
//!
//! A Semigroup is a type with an associative binary operation. Effect metadata is merged
//! with this operation every time two effectful sources meet inside a wrapped call, so the
//! only requirement placed on a metadata "fact" is that it can be combined associatively.
//!
//! # Mathematical Properties
//!
//! For a type to be a valid Semigroup, the `combine` operation must be associative:
//! ```text
//! a.combine(b).combine(c) == a.combine(b.combine(c))
//! ```
//!
//! # Examples
//!
//! ```
//! use confluence::Semigroup;
//! use confluence::monoid::Any;
//! use std::collections::BTreeSet;
//!
//! // Sets merge by union
//! let a: BTreeSet<_> = ["NotFound"].into_iter().collect();
//! let b: BTreeSet<_> = ["Timeout"].into_iter().collect();
//! assert_eq!(a.combine(b).len(), 2);
//!
//! // Flags merge by boolean-or
//! assert_eq!(Any(false).combine(Any(true)), Any(true));
//! ```

use std::collections::BTreeSet;

/// A type that supports an associative binary operation
///
/// # Laws
///
/// Implementations must satisfy the associativity law:
/// ```text
/// a.combine(b).combine(c) == a.combine(b.combine(c))
/// ```
///
/// # Note on Ownership
///
/// The `combine` method takes `self` by value, not by reference. If you need to
/// preserve the original values, you must clone them before combining.
pub trait Semigroup: Sized {
    /// Combine this value with another value associatively
    ///
    /// # Examples
    ///
    /// ```
    /// use confluence::{EffectMetadata, Semigroup};
    ///
    /// let merged = EffectMetadata::failing("A").combine(EffectMetadata::new().with_async());
    /// assert!(merged.declares("A"));
    /// assert!(merged.is_async());
    /// ```
    fn combine(self, other: Self) -> Self;
}

// Union. Also commutative, which the metadata algebra relies on.
impl<T: Ord> Semigroup for BTreeSet<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

macro_rules! impl_semigroup_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Semigroup),+> Semigroup for ($($T,)+) {
            #[inline]
            fn combine(self, other: Self) -> Self {
                (
                    $(self.$idx.combine(other.$idx)),+
                )
            }
        }
    };
}

// Records of independent facts merge field by field.
impl_semigroup_tuple!(0 T1, 1 T2);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monoid::Any;

    #[test]
    fn test_btreeset_is_union() {
        let a: BTreeSet<_> = [1, 2].into_iter().collect();
        let b: BTreeSet<_> = [2, 3].into_iter().collect();
        assert_eq!(a.combine(b), [1, 2, 3].into_iter().collect());
    }

    #[test]
    fn test_btreeset_commutes() {
        let a: BTreeSet<_> = ["A"].into_iter().collect();
        let b: BTreeSet<_> = ["B", "C"].into_iter().collect();
        assert_eq!(a.clone().combine(b.clone()), b.combine(a));
    }

    #[test]
    fn test_tuple_associativity() {
        let set = |tag: &'static str| -> BTreeSet<&'static str> { [tag].into_iter().collect() };
        let a = (Any(false), set("A"));
        let b = (Any(true), set("B"));
        let c = (Any(false), set("C"));

        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));

        assert_eq!(left, right);
    }
}
