//! Effect metadata and its merge algebra
//!
//! Every [`Carrier`](crate::Carrier) records two facts about the value it wraps:
//!
//! - whether any part of the computation that produced it was asynchronous
//! - the set of tagged error variants that could reach this point
//!
//! Both facts only grow under composition. Merging is a union at each name (boolean-or
//! for `async`, set union for the error variants), which makes [`EffectMetadata`] a
//! commutative [`Monoid`] whose identity is the empty record. The only way to remove an
//! error variant is [`EffectMetadata::narrow`], used by partial discharge.
//!
//! # Example
//!
//! ```
//! use confluence::{EffectMetadata, Semigroup};
//!
//! let a = EffectMetadata::failing("NotFound");
//! let b = EffectMetadata::failing("Timeout").with_async();
//!
//! let merged = a.combine(b);
//! assert!(merged.is_async());
//! assert!(merged.declares("NotFound"));
//! assert!(merged.declares("Timeout"));
//! ```

use std::collections::BTreeSet;
use std::fmt;

use crate::monoid::{Any, Monoid};
use crate::tagged::Tagged;
use crate::Semigroup;

/// Discriminant of a tagged error variant.
pub type Tag = &'static str;

/// Facts accumulated about a carrier while it threads through a composition chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EffectMetadata {
    #[cfg_attr(feature = "serde", serde(rename = "async"))]
    is_async: bool,
    #[cfg_attr(feature = "serde", serde(rename = "errorVariants"))]
    error_variants: BTreeSet<Tag>,
}

impl EffectMetadata {
    /// The empty record: synchronous, no error variants.
    pub fn new() -> Self {
        Self::default()
    }

    /// A record declaring a single error variant.
    pub fn failing(tag: Tag) -> Self {
        Self::new().with_variant(tag)
    }

    /// A record declaring every variant an error type can carry.
    ///
    /// ```
    /// use confluence::{Defect, EffectMetadata};
    ///
    /// let meta = EffectMetadata::variants_of::<Defect>();
    /// assert!(meta.declares("PromiseRejected") && meta.declares("UnknownException"));
    /// ```
    pub fn variants_of<E: Tagged>() -> Self {
        E::variants()
            .iter()
            .fold(Self::new(), |meta, &tag| meta.with_variant(tag))
    }

    /// A record declaring only asynchrony.
    pub fn asynchronous() -> Self {
        Self::new().with_async()
    }

    /// Add an error variant.
    pub fn with_variant(mut self, tag: Tag) -> Self {
        self.error_variants.insert(tag);
        self
    }

    /// Mark as asynchronous.
    pub fn with_async(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Whether any merged source was asynchronous.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Every error variant that could reach this point, in tag order.
    pub fn error_variants(&self) -> &BTreeSet<Tag> {
        &self.error_variants
    }

    /// Whether `tag` is among the declared error variants.
    pub fn declares(&self, tag: &str) -> bool {
        self.error_variants.contains(tag)
    }

    /// True for the identity record.
    pub fn is_empty(&self) -> bool {
        !self.is_async && self.error_variants.is_empty()
    }

    /// Merge by reference, leaving both operands intact.
    pub fn merge(&self, other: &Self) -> Self {
        self.clone().combine(other.clone())
    }

    /// Remove exactly the given tags from the declared error variants.
    ///
    /// The `async` fact is untouched.
    ///
    /// ```
    /// use confluence::EffectMetadata;
    ///
    /// let meta = EffectMetadata::failing("A").with_variant("B").with_async();
    /// let narrowed = meta.narrow(["A"]);
    /// assert!(!narrowed.declares("A"));
    /// assert!(narrowed.declares("B"));
    /// assert!(narrowed.is_async());
    /// ```
    pub fn narrow<'a, I>(mut self, handled: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        for tag in handled {
            self.error_variants.remove(tag);
        }
        self
    }
}

impl Semigroup for EffectMetadata {
    fn combine(self, other: Self) -> Self {
        let (Any(is_async), error_variants) = (Any(self.is_async), self.error_variants)
            .combine((Any(other.is_async), other.error_variants));
        EffectMetadata {
            is_async,
            error_variants,
        }
    }
}

impl Monoid for EffectMetadata {
    fn empty() -> Self {
        Self::default()
    }
}

impl fmt::Display for EffectMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{async: {}, errors: [", self.is_async)?;
        for (i, tag) in self.error_variants.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tag)?;
        }
        write!(f, "]}}")
    }
}

/// Merge any number of records. The empty iterator yields the identity.
pub fn merge_all<'a, I>(records: I) -> EffectMetadata
where
    I: IntoIterator<Item = &'a EffectMetadata>,
{
    crate::monoid::fold_all(records.into_iter().cloned())
}
