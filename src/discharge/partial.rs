//! Partial discharge: drain selected error tags out of a pipeline.

use std::collections::BTreeMap;
use std::fmt;

use crate::carrier::{Carrier, Payload};
use crate::meta::Tag;
use crate::tagged::Tagged;

type RecoverArm<A, E> = Box<dyn FnOnce(E) -> A + Send>;

/// Recovery handlers keyed by error tag.
pub struct Recover<A, E> {
    by_tag: BTreeMap<Tag, RecoverArm<A, E>>,
}

impl<A, E> fmt::Debug for Recover<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recover")
            .field("tags", &self.by_tag.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A, E> Default for Recover<A, E> {
    fn default() -> Self {
        Recover {
            by_tag: BTreeMap::new(),
        }
    }
}

impl<A, E: Tagged> Recover<A, E> {
    /// No handlers yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace errors tagged `tag` with the value `f` produces.
    pub fn on<F>(mut self, tag: Tag, f: F) -> Self
    where
        F: FnOnce(E) -> A + Send + 'static,
    {
        self.by_tag.insert(tag, Box::new(f));
        self
    }

    /// The tags this set of handlers resolves.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.by_tag.keys().copied()
    }

    fn apply(mut self, result: Result<A, E>) -> Result<A, E> {
        match result {
            Ok(value) => Ok(value),
            Err(error) => match self.by_tag.remove(error.tag()) {
                Some(arm) => Ok(arm(error)),
                None => Err(error),
            },
        }
    }
}

/// A carrier awaiting its recovery handlers. Created by [`partial`].
#[derive(Debug)]
pub struct Partial<A, E> {
    carrier: Carrier<A, E>,
}

impl<A, E> Partial<A, E>
where
    A: Send + 'static,
    E: Tagged + Send + 'static,
{
    /// Resolve the selected tags into success values.
    ///
    /// Unselected errors and the `async` fact pass through untouched. The returned
    /// carrier's declared error variants are the input's minus exactly the handled tags.
    /// Pending and deferred carriers stay pending and deferred.
    pub fn with(self, recover: Recover<A, E>) -> Carrier<A, E> {
        let handled: Vec<Tag> = recover.tags().collect();
        let (payload, meta) = self.carrier.into_parts();
        let meta = meta.narrow(handled.iter().copied());

        let payload = match payload {
            Payload::Settled(result) => Payload::Settled(recover.apply(result)),
            Payload::Pending(future) => {
                Payload::Pending(Box::pin(async move { recover.apply(future.await) }))
            }
            Payload::Deferred(thunk) => Payload::Deferred(Box::new(
                (*thunk).map(move |inner| partial(inner).with(recover)),
            )),
        };

        tracing::trace!(handled = ?handled, remaining = %meta, "partially discharged carrier");
        Carrier::from_parts(payload, meta)
    }
}

/// Begin a partial discharge of `carrier`.
///
/// # Example
///
/// ```
/// use confluence::{err, partial, Carrier, EffectMetadata, Recover, Tagged};
///
/// #[derive(Debug, PartialEq)]
/// enum FetchError {
///     CacheMiss,
///     Network,
/// }
///
/// impl Tagged for FetchError {
///     fn tag(&self) -> &'static str {
///         match self {
///             FetchError::CacheMiss => "CacheMiss",
///             FetchError::Network => "Network",
///         }
///     }
///
///     fn variants() -> &'static [&'static str] {
///         &["CacheMiss", "Network"]
///     }
/// }
///
/// let carrier: Carrier<u32, FetchError> =
///     err(FetchError::CacheMiss).merge_meta(&EffectMetadata::failing("Network"));
///
/// let recovered = partial(carrier).with(Recover::new().on("CacheMiss", |_| 0));
/// assert!(!recovered.meta().declares("CacheMiss"));
/// assert!(recovered.meta().declares("Network"));
/// assert_eq!(recovered.peek(), Some(&Ok(0)));
/// ```
pub fn partial<A, E>(carrier: Carrier<A, E>) -> Partial<A, E> {
    Partial { carrier }
}
