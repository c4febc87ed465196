//! One-shot values settled from elsewhere.
//!
//! A [`RemoteValue`] is a rendezvous: some other part of the program fills or fails it
//! exactly once, and anyone holding a clone can await the outcome. Settlement is guarded
//! by an atomic flag, so when several writers race only the first one wins.
//!
//! An optional timeout fails the value with [`RemoteError::Timeout`] if nobody settles
//! it in time. An optional [`Registry`] lets a caller that only knows the
//! [`RemoteId`] settle it. Both are cleaned up at settlement.
//!
//! # Example
//!
//! ```
//! use confluence::{Registry, RemoteOptions, RemoteValue};
//!
//! # tokio_test::block_on(async {
//! let registry = Registry::new();
//! let reply: RemoteValue<String> =
//!     RemoteValue::with_options(RemoteOptions::new().with_registry(registry.clone()));
//!
//! // Somewhere else, with only the id:
//! assert!(registry.resolve_by_id(reply.id(), "pong".to_string()));
//!
//! assert_eq!(reply.wait().await, Ok("pong".to_string()));
//! assert!(registry.is_empty());
//! # });
//! ```

mod error;
mod registry;

pub use error::RemoteError;
pub use registry::Registry;

use std::fmt;
use std::future::IntoFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::defect::Cause;

use registry::Entries;

/// Opaque identity of a [`RemoteValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemoteId(Uuid);

impl RemoteId {
    fn generate() -> Self {
        RemoteId(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Construction options for [`RemoteValue`].
pub struct RemoteOptions<T> {
    timeout: Option<Duration>,
    registry: Option<Registry<T>>,
}

impl<T> Default for RemoteOptions<T> {
    fn default() -> Self {
        RemoteOptions {
            timeout: None,
            registry: None,
        }
    }
}

impl<T> fmt::Debug for RemoteOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteOptions")
            .field("timeout", &self.timeout)
            .field("registry", &self.registry)
            .finish()
    }
}

impl<T> RemoteOptions<T> {
    /// No timeout, no registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`RemoteError::Timeout`] after `after` unless settled first.
    ///
    /// The timer runs on the current tokio runtime. Outside a runtime the timeout is
    /// ignored with a warning.
    pub fn with_timeout(mut self, after: Duration) -> Self {
        self.timeout = Some(after);
        self
    }

    /// Register under the value's id until it settles.
    pub fn with_registry(mut self, registry: Registry<T>) -> Self {
        self.registry = Some(registry);
        self
    }
}

type Slot<T> = Option<Result<T, RemoteError>>;

struct Inner<T> {
    id: RemoteId,
    settled: AtomicBool,
    slot: watch::Sender<Slot<T>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    registry: Option<Weak<Entries<T>>>,
}

/// A one-shot value settled from elsewhere. Clones share the same slot.
pub struct RemoteValue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RemoteValue<T> {
    fn clone(&self) -> Self {
        RemoteValue {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for RemoteValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteValue")
            .field("id", &self.inner.id)
            .field("settled", &self.inner.settled.load(Ordering::Acquire))
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for RemoteValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> RemoteValue<T> {
    /// An unsettled value without timeout or registry.
    pub fn new() -> Self {
        Self::with_options(RemoteOptions::default())
    }

    /// An unsettled value configured by `options`.
    pub fn with_options(options: RemoteOptions<T>) -> Self {
        let (slot, _) = watch::channel(None);
        let remote = RemoteValue {
            inner: Arc::new(Inner {
                id: RemoteId::generate(),
                settled: AtomicBool::new(false),
                slot,
                timer: Mutex::new(None),
                registry: options.registry.as_ref().map(Registry::downgrade),
            }),
        };

        if let Some(registry) = &options.registry {
            registry.insert(remote.clone());
        }
        if let Some(after) = options.timeout {
            remote.arm_timer(after);
        }
        tracing::trace!(id = %remote.id(), timeout = ?options.timeout, "created remote value");
        remote
    }

    /// This value's identity.
    pub fn id(&self) -> RemoteId {
        self.inner.id
    }

    /// Whether `fill` or `fail` has already succeeded.
    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::Acquire)
    }

    /// Settle with a value. Returns `false` if already settled.
    pub fn fill(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settle with a failure. Returns `false` if already settled.
    pub fn fail(&self, cause: impl Into<Cause>) -> bool {
        self.settle(Err(RemoteError::Failed(cause.into())))
    }

    /// The outcome, if settled.
    pub fn peek(&self) -> Option<Result<T, RemoteError>> {
        self.inner.slot.borrow().clone()
    }

    /// Wait for settlement.
    pub async fn wait(&self) -> Result<T, RemoteError> {
        let mut receiver = self.inner.slot.subscribe();
        let settled = receiver
            .wait_for(Option::is_some)
            .await
            .map(|slot| (*slot).clone());
        match settled {
            Ok(Some(outcome)) => outcome,
            _ => Err(RemoteError::Failed(Cause::new(
                "remote value dropped before settlement",
            ))),
        }
    }

    fn settle(&self, outcome: Result<T, RemoteError>) -> bool {
        if self
            .inner
            .settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(id = %self.id(), "remote value already settled; ignoring");
            return false;
        }

        if let Some(timer) = self.inner.timer.lock().take() {
            timer.abort();
        }
        if let Some(entries) = self.inner.registry.as_ref().and_then(Weak::upgrade) {
            entries.lock().remove(&self.inner.id);
        }

        tracing::debug!(id = %self.id(), ok = outcome.is_ok(), "remote value settled");
        self.inner.slot.send_replace(Some(outcome));
        true
    }

    fn arm_timer(&self, after: Duration) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!(id = %self.id(), ?after, "no tokio runtime; timeout disabled");
                return;
            }
        };

        let remote = self.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if remote.settle(Err(RemoteError::Timeout { after })) {
                tracing::debug!(id = %remote.id(), ?after, "remote value timed out");
            }
        });
        *self.inner.timer.lock() = Some(timer);
    }
}

impl<T: Clone + Send + Sync + 'static> IntoFuture for RemoteValue<T> {
    type Output = Result<T, RemoteError>;
    type IntoFuture = BoxFuture<'static, Result<T, RemoteError>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.wait().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_fill_once() {
        let remote = RemoteValue::new();
        assert!(remote.fill(1));
        assert!(!remote.fill(2));
        assert!(!remote.fail("late"));
        assert_eq!(remote.peek(), Some(Ok(1)));
        assert!(logs_contain("already settled"));
    }

    #[tokio::test]
    async fn test_wait_after_fail() {
        let remote: RemoteValue<i32> = RemoteValue::new();
        assert!(remote.fail("refused"));
        assert_eq!(
            remote.wait().await,
            Err(RemoteError::Failed(Cause::new("refused")))
        );
    }

    #[tokio::test]
    async fn test_many_waiters_see_one_value() {
        let remote = RemoteValue::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let remote = remote.clone();
                tokio::spawn(async move { remote.await })
            })
            .collect();

        tokio::task::yield_now().await;
        assert!(remote.fill("ready"));

        for waiter in waiters {
            assert_eq!(waiter.await.ok(), Some(Ok("ready")));
        }
    }

    #[tokio::test]
    async fn test_racing_writers_single_winner() {
        let remote = RemoteValue::new();
        let writers: Vec<_> = (0..16)
            .map(|i| {
                let remote = remote.clone();
                tokio::spawn(async move { remote.fill(i) })
            })
            .collect();

        let mut winners = 0;
        for writer in writers {
            if writer.await.unwrap_or(false) {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(remote.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails() {
        let remote: RemoteValue<i32> =
            RemoteValue::with_options(RemoteOptions::new().with_timeout(Duration::from_millis(5)));

        let outcome = remote.wait().await;
        assert_eq!(
            outcome,
            Err(RemoteError::Timeout {
                after: Duration::from_millis(5)
            })
        );
        assert!(remote.is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settlement_cancels_timer() {
        let remote =
            RemoteValue::with_options(RemoteOptions::new().with_timeout(Duration::from_millis(5)));
        assert!(remote.fill(3));
        assert!(remote.inner.timer.lock().is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(remote.peek(), Some(Ok(3)));
    }

    #[test]
    #[traced_test]
    fn test_timeout_without_runtime_is_ignored() {
        let remote: RemoteValue<i32> =
            RemoteValue::with_options(RemoteOptions::new().with_timeout(Duration::from_millis(1)));
        assert!(!remote.is_settled());
        assert!(logs_contain("timeout disabled"));
    }
}
