//! Wrap-time configuration.

use std::fmt;
use std::sync::Arc;

use crate::defect::{Cause, Defect};
use crate::meta::{EffectMetadata, Tag};
use crate::tagged::Tagged;

type DefectFn<E> = Arc<dyn Fn(Cause) -> E + Send + Sync>;

/// Options supplied when wrapping a handler.
///
/// Without mappers, defects become `E::from(Defect::..)`. Whatever tag a defect ends up
/// with is the tag that gets declared: the conversion (or mapper) is also run once on an
/// empty cause to learn it, so mappers should not have side effects.
///
/// # Example
///
/// ```
/// use confluence::{Cause, Defect, WrapOptions};
///
/// #[derive(Debug)]
/// enum AppError {
///     Crashed(String),
/// }
///
/// let options: WrapOptions<AppError> = WrapOptions::new()
///     .map_defect(|defect: Defect| AppError::Crashed(defect.cause().to_string()))
///     .declare("Crashed");
/// assert!(options.declared().declares("Crashed"));
/// ```
pub struct WrapOptions<E> {
    map_rejected: Option<DefectFn<E>>,
    map_thrown: Option<DefectFn<E>>,
    declared: EffectMetadata,
}

impl<E> Clone for WrapOptions<E> {
    fn clone(&self) -> Self {
        WrapOptions {
            map_rejected: self.map_rejected.clone(),
            map_thrown: self.map_thrown.clone(),
            declared: self.declared.clone(),
        }
    }
}

impl<E> Default for WrapOptions<E> {
    fn default() -> Self {
        WrapOptions {
            map_rejected: None,
            map_thrown: None,
            declared: EffectMetadata::new(),
        }
    }
}

impl<E> fmt::Debug for WrapOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapOptions")
            .field("map_rejected", &self.map_rejected.is_some())
            .field("map_thrown", &self.map_thrown.is_some())
            .field("declared", &self.declared)
            .finish()
    }
}

impl<E> WrapOptions<E> {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map rejections of awaited sources.
    pub fn map_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Cause) -> E + Send + Sync + 'static,
    {
        self.map_rejected = Some(Arc::new(f));
        self
    }

    /// Map handler panics.
    pub fn map_thrown<F>(mut self, f: F) -> Self
    where
        F: Fn(Cause) -> E + Send + Sync + 'static,
    {
        self.map_thrown = Some(Arc::new(f));
        self
    }

    /// Map both kinds of defect with one function.
    pub fn map_defect<F>(self, f: F) -> Self
    where
        F: Fn(Defect) -> E + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let thrown = f.clone();
        self.map_rejected(move |cause| f(Defect::PromiseRejected { cause }))
            .map_thrown(move |cause| thrown(Defect::UnknownException { cause }))
    }

    /// Declare an error variant the handler itself may produce.
    pub fn declare(mut self, tag: Tag) -> Self {
        self.declared = self.declared.with_variant(tag);
        self
    }

    /// The handler's declared contribution to result metadata.
    pub fn declared(&self) -> &EffectMetadata {
        &self.declared
    }

}

impl<E: From<Defect>> WrapOptions<E> {
    pub(crate) fn rejected(&self, cause: Cause) -> E {
        tracing::debug!(%cause, "awaited value rejected; converting to defect");
        self.convert_rejected(cause)
    }

    pub(crate) fn thrown(&self, cause: Cause) -> E {
        tracing::debug!(%cause, "handler panicked; converting to defect");
        self.convert_thrown(cause)
    }

    fn convert_rejected(&self, cause: Cause) -> E {
        match &self.map_rejected {
            Some(f) => f(cause),
            None => E::from(Defect::PromiseRejected { cause }),
        }
    }

    fn convert_thrown(&self, cause: Cause) -> E {
        match &self.map_thrown {
            Some(f) => f(cause),
            None => E::from(Defect::UnknownException { cause }),
        }
    }
}

impl<E: Tagged + From<Defect>> WrapOptions<E> {
    /// What an awaited source adds to the metadata: `async` and the tag a rejection
    /// converts to.
    pub(crate) fn rejection_meta(&self) -> EffectMetadata {
        EffectMetadata::failing(self.convert_rejected(Cause::new("")).tag()).with_async()
    }

    /// The tags both kinds of defect convert to.
    pub(crate) fn defect_meta(&self) -> EffectMetadata {
        EffectMetadata::failing(self.convert_thrown(Cause::new("")).tag())
            .with_variant(self.convert_rejected(Cause::new("")).tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Defect(Defect),
        Mapped(&'static str, String),
    }

    impl From<Defect> for TestError {
        fn from(defect: Defect) -> Self {
            TestError::Defect(defect)
        }
    }

    impl Tagged for TestError {
        fn tag(&self) -> Tag {
            match self {
                TestError::Defect(defect) => defect.tag(),
                TestError::Mapped(..) => "Mapped",
            }
        }

        fn variants() -> &'static [Tag] {
            &["PromiseRejected", "UnknownException", "Mapped"]
        }
    }

    #[derive(Debug, PartialEq)]
    struct Crashed;

    impl From<Defect> for Crashed {
        fn from(_: Defect) -> Self {
            Crashed
        }
    }

    impl Tagged for Crashed {
        fn tag(&self) -> Tag {
            "Crashed"
        }

        fn variants() -> &'static [Tag] {
            &["Crashed"]
        }
    }

    #[test]
    fn test_default_mapping() {
        let options = WrapOptions::<TestError>::new();
        assert_eq!(
            options.thrown(Cause::new("x")),
            TestError::Defect(Defect::UnknownException {
                cause: Cause::new("x")
            })
        );
        assert_eq!(
            options.rejected(Cause::new("y")),
            TestError::Defect(Defect::PromiseRejected {
                cause: Cause::new("y")
            })
        );
    }

    #[test]
    fn test_map_defect_covers_both() {
        let options = WrapOptions::new().map_defect(|defect: Defect| {
            let kind = if defect.is_rejection() { "rejected" } else { "thrown" };
            TestError::Mapped(kind, defect.cause().to_string())
        });
        assert_eq!(
            options.thrown(Cause::new("a")),
            TestError::Mapped("thrown", "a".into())
        );
        assert_eq!(
            options.rejected(Cause::new("b")),
            TestError::Mapped("rejected", "b".into())
        );
    }

    #[test]
    fn test_single_mapper_leaves_other_default() {
        let options =
            WrapOptions::new().map_thrown(|cause: Cause| TestError::Mapped("t", cause.to_string()));
        assert_eq!(options.thrown(Cause::new("a")), TestError::Mapped("t", "a".into()));
        assert!(matches!(
            options.rejected(Cause::new("b")),
            TestError::Defect(Defect::PromiseRejected { .. })
        ));
    }

    #[test]
    fn test_rejection_meta() {
        let default = WrapOptions::<TestError>::new().rejection_meta();
        assert!(default.is_async() && default.declares("PromiseRejected"));

        let mapped = WrapOptions::new()
            .map_rejected(|cause: Cause| TestError::Mapped("r", cause.to_string()))
            .rejection_meta();
        assert!(mapped.is_async());
        assert_eq!(mapped.error_variants().iter().copied().collect::<Vec<_>>(), vec!["Mapped"]);
    }

    #[test]
    fn test_declared_defect_tags_follow_conversion() {
        let options = WrapOptions::<Crashed>::new();
        let rejection = options.rejection_meta();
        assert!(rejection.declares("Crashed"));
        assert!(!rejection.declares("PromiseRejected"));

        let defects = options.defect_meta();
        assert_eq!(defects.error_variants().iter().copied().collect::<Vec<_>>(), vec!["Crashed"]);
        assert!(!defects.is_async());
    }

    #[test]
    fn test_defect_meta_with_default_conversion() {
        let defects = WrapOptions::<TestError>::new().defect_meta();
        assert!(defects.declares("PromiseRejected") && defects.declares("UnknownException"));
    }
}
