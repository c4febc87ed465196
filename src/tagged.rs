//! Tagged error contract and the transient `Fail` marker
//!
//! Domain errors that travel through a [`Carrier`](crate::Carrier) expose a string
//! discriminant via [`Tagged`]. The discriminant is what effect metadata records, what
//! [`matching`](crate::matching) dispatches on and what [`partial`](crate::partial)
//! narrows away.
//!
//! # Example
//!
//! ```
//! use confluence::{Fail, Tagged};
//!
//! #[derive(Debug, PartialEq)]
//! enum UserError {
//!     Empty,
//!     TooLong(usize),
//! }
//!
//! impl Tagged for UserError {
//!     fn tag(&self) -> &'static str {
//!         match self {
//!             UserError::Empty => "Empty",
//!             UserError::TooLong(_) => "TooLong",
//!         }
//!     }
//!
//!     fn variants() -> &'static [&'static str] {
//!         &["Empty", "TooLong"]
//!     }
//! }
//!
//! fn check(name: &str) -> Result<String, UserError> {
//!     if name.is_empty() {
//!         return UserError::Empty.fail().into();
//!     }
//!     Ok(name.to_string())
//! }
//!
//! assert_eq!(check(""), Err(UserError::Empty));
//! ```

use crate::meta::Tag;

/// A value carrying a `_tag`-style discriminant.
pub trait Tagged {
    /// The discriminant of this value's variant.
    fn tag(&self) -> Tag;

    /// Every discriminant a value of this type can carry.
    ///
    /// Carriers whose outcome is not known yet (pending work, a handler that runs after
    /// an awaited input) declare this whole set, so it must cover every `tag()` result,
    /// including the tags produced by the type's `From<Defect>` conversion.
    fn variants() -> &'static [Tag]
    where
        Self: Sized;

    /// Wrap this error in a [`Fail`] marker for returning from a handler body.
    fn fail(self) -> Fail<Self>
    where
        Self: Sized,
    {
        Fail::new(self)
    }

    /// A settled failing carrier holding this error.
    fn err<A>(self) -> crate::Carrier<A, Self>
    where
        Self: Sized,
    {
        crate::Carrier::err(self)
    }
}

impl<T: Tagged> Tagged for Box<T> {
    fn tag(&self) -> Tag {
        (**self).tag()
    }

    fn variants() -> &'static [Tag] {
        T::variants()
    }
}

/// A lightweight "this call failed with `E`" marker.
///
/// `Fail` carries no metadata. It converts into a failing `Result` or a failing
/// [`Carrier`](crate::Carrier) at the boundary where it is produced, and the combinator
/// records its tag when the conversion happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fail<E> {
    error: E,
}

impl<E> Fail<E> {
    /// Create a marker for `error`.
    pub fn new(error: E) -> Self {
        Fail { error }
    }

    /// Borrow the error.
    pub fn error(&self) -> &E {
        &self.error
    }

    /// Consume the marker and return the error.
    pub fn into_error(self) -> E {
        self.error
    }

    /// Lift the error into a wider error type.
    pub fn widen<E2: From<E>>(self) -> Fail<E2> {
        Fail::new(E2::from(self.error))
    }
}

impl<A, E> From<Fail<E>> for Result<A, E> {
    fn from(marker: Fail<E>) -> Self {
        Err(marker.error)
    }
}

/// Build a [`Fail`] marker.
///
/// ```
/// use confluence::fail;
///
/// let result: Result<i32, &str> = fail("boom").into();
/// assert_eq!(result, Err("boom"));
/// ```
pub fn fail<E>(error: E) -> Fail<E> {
    Fail::new(error)
}
