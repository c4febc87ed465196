//! Exhaustive dispatch of a carrier's outcome.

use std::collections::BTreeMap;
use std::fmt;

use super::Discharged;
use crate::carrier::Carrier;
use crate::meta::{EffectMetadata, Tag};
use crate::tagged::Tagged;

type OkArm<A, R> = Box<dyn FnOnce(A) -> R + Send>;
type ErrArm<E, R> = Box<dyn FnOnce(E) -> R + Send>;

/// Handlers for discharging a carrier.
///
/// An `ok` arm is always required. Errors go to the arm registered for their tag with
/// [`Arms::on`], falling back to the catch-all registered with [`Arms::err`].
pub struct Arms<A, E, R> {
    ok: OkArm<A, R>,
    catch_all: Option<ErrArm<E, R>>,
    by_tag: BTreeMap<Tag, ErrArm<E, R>>,
}

impl<A, E, R> fmt::Debug for Arms<A, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arms")
            .field("catch_all", &self.catch_all.is_some())
            .field("tags", &self.by_tag.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A, E: Tagged, R> Arms<A, E, R> {
    /// Start with the success arm.
    pub fn ok<F>(f: F) -> Self
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        Arms {
            ok: Box::new(f),
            catch_all: None,
            by_tag: BTreeMap::new(),
        }
    }

    /// Handle every error not claimed by a tagged arm.
    pub fn err<F>(mut self, f: F) -> Self
    where
        F: FnOnce(E) -> R + Send + 'static,
    {
        self.catch_all = Some(Box::new(f));
        self
    }

    /// Handle errors whose tag is `tag`.
    pub fn on<F>(mut self, tag: Tag, f: F) -> Self
    where
        F: FnOnce(E) -> R + Send + 'static,
    {
        self.by_tag.insert(tag, Box::new(f));
        self
    }

    /// Panics unless every declared variant has somewhere to go.
    fn check(&self, meta: &EffectMetadata) {
        if self.catch_all.is_some() {
            return;
        }
        if let Some(tag) = meta
            .error_variants()
            .iter()
            .find(|tag| !self.by_tag.contains_key(*tag))
        {
            panic!("missing error handler for `{}`", tag);
        }
    }

    fn dispatch(mut self, result: Result<A, E>) -> R {
        match result {
            Ok(value) => (self.ok)(value),
            Err(error) => {
                let tag = error.tag();
                if let Some(arm) = self.by_tag.remove(tag) {
                    return arm(error);
                }
                match self.catch_all {
                    Some(arm) => arm(error),
                    None => panic!("missing error handler for `{}`", tag),
                }
            }
        }
    }
}

/// A carrier awaiting its arms. Created by [`matching`].
#[derive(Debug)]
pub struct Match<A, E> {
    carrier: Carrier<A, E>,
}

impl<A, E> Match<A, E>
where
    A: Send + 'static,
    E: Tagged + Send + 'static,
{
    /// Dispatch the outcome.
    ///
    /// Deferred carriers are forced first. Settled carriers dispatch immediately; pending
    /// ones yield a pending [`Discharged`] that dispatches once the payload settles.
    ///
    /// # Panics
    ///
    /// If the metadata declares an error variant with no arm and there is no catch-all,
    /// or if the payload settles into an error with no matching arm. Both mean the
    /// discharge is incomplete; neither is recoverable.
    pub fn with<R>(self, arms: Arms<A, E, R>) -> Discharged<R>
    where
        R: Send + 'static,
    {
        let carrier = self.carrier.force();
        arms.check(carrier.meta());
        carrier.attempt().map(move |result| arms.dispatch(result))
    }
}

/// Begin discharging `carrier`.
///
/// # Example
///
/// ```
/// use confluence::{err, matching, Arms, Carrier, Tagged};
///
/// #[derive(Debug)]
/// enum LookupError {
///     Missing,
///     Forbidden,
/// }
///
/// impl Tagged for LookupError {
///     fn tag(&self) -> &'static str {
///         match self {
///             LookupError::Missing => "Missing",
///             LookupError::Forbidden => "Forbidden",
///         }
///     }
///
///     fn variants() -> &'static [&'static str] {
///         &["Missing", "Forbidden"]
///     }
/// }
///
/// let carrier: Carrier<String, LookupError> = err(LookupError::Missing);
/// let shown = matching(carrier).with(
///     Arms::ok(|name: String| name)
///         .on("Missing", |_| "anonymous".to_string())
///         .on("Forbidden", |_| "hidden".to_string()),
/// );
/// assert_eq!(shown.into_ready().ok(), Some("anonymous".to_string()));
/// ```
pub fn matching<A, E>(carrier: Carrier<A, E>) -> Match<A, E> {
    Match { carrier }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::{err, ok};
    use crate::lazy::lazy;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        A,
        B,
    }

    impl Tagged for TestError {
        fn tag(&self) -> Tag {
            match self {
                TestError::A => "A",
                TestError::B => "B",
            }
        }

        fn variants() -> &'static [Tag] {
            &["A", "B"]
        }
    }

    fn ready<R>(discharged: Discharged<R>) -> R {
        match discharged.into_ready() {
            Ok(value) => value,
            Err(_) => panic!("expected a settled discharge"),
        }
    }

    #[test]
    fn test_ok_arm() {
        let out = matching(ok::<_, TestError>(2)).with(Arms::ok(|x: i32| x * 10));
        assert_eq!(ready(out), 20);
    }

    #[test]
    fn test_catch_all() {
        let out = matching(err::<i32, _>(TestError::B))
            .with(Arms::ok(|x: i32| x).err(|e: TestError| if e == TestError::B { -1 } else { -2 }));
        assert_eq!(ready(out), -1);
    }

    #[test]
    fn test_tagged_arm_wins_over_catch_all() {
        let out = matching(err::<i32, _>(TestError::A)).with(
            Arms::ok(|x: i32| x)
                .on("A", |_| 100)
                .err(|_| 0),
        );
        assert_eq!(ready(out), 100);
    }

    #[test]
    #[should_panic(expected = "missing error handler for `B`")]
    fn test_incomplete_arms_panic() {
        let carrier = err::<i32, _>(TestError::A).merge_meta(&EffectMetadata::failing("B"));
        let _ = matching(carrier).with(Arms::ok(|x: i32| x).on("A", |_| 0));
    }

    #[test]
    #[should_panic(expected = "missing error handler for `A`")]
    fn test_undeclared_error_without_arm_panics() {
        let carrier = crate::carrier::Carrier::from_parts(
            crate::carrier::Payload::Settled(Err(TestError::A)),
            EffectMetadata::new(),
        );
        let _ = matching(carrier).with(Arms::ok(|x: i32| x));
    }

    #[tokio::test]
    async fn test_pending_dispatches_after_settle() {
        let carrier = Carrier::<i32, TestError>::pending(async { Err(TestError::B) });
        let out = matching(carrier).with(Arms::ok(|x: i32| x).on("A", |_| 0).on("B", |_| 7));
        assert!(out.is_pending());
        assert_eq!(out.await, 7);
    }

    #[test]
    fn test_deferred_is_forced() {
        let carrier = Carrier::deferred(lazy(|| ok::<_, TestError>(5)), EffectMetadata::new());
        let out = matching(carrier).with(Arms::ok(|x: i32| x + 1));
        assert_eq!(ready(out), 6);
    }
}
