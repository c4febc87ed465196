//! Settlement by identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::defect::Cause;

use super::{RemoteId, RemoteValue};

pub(super) type Entries<T> = Mutex<HashMap<RemoteId, RemoteValue<T>>>;

/// A map from [`RemoteId`] to live remote values.
///
/// Values join a registry through [`RemoteOptions::with_registry`](super::RemoteOptions::with_registry)
/// and leave it when they settle, whichever way that happens. Clones share one map.
pub struct Registry<T> {
    entries: Arc<Entries<T>>,
}

impl<T> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Registry {
            entries: self.entries.clone(),
        }
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.entries.lock().len())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Registry<T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the value registered under `id`.
    ///
    /// Returns `false` when nothing is registered under `id` (never registered, or
    /// already settled) or when another caller won the settlement race.
    pub fn resolve_by_id(&self, id: RemoteId, value: T) -> bool {
        match self.get(id) {
            Some(remote) => remote.fill(value),
            None => {
                tracing::warn!(%id, "resolve for unknown remote value");
                false
            }
        }
    }

    /// Fail the value registered under `id`. Same return contract as
    /// [`Registry::resolve_by_id`].
    pub fn reject_by_id(&self, id: RemoteId, cause: impl Into<Cause>) -> bool {
        match self.get(id) {
            Some(remote) => remote.fail(cause),
            None => {
                tracing::warn!(%id, "reject for unknown remote value");
                false
            }
        }
    }

    /// Whether `id` is registered and unsettled.
    pub fn contains(&self, id: RemoteId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Number of unsettled registered values.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no values are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    // The lock is released before settling; settlement removes the entry.
    fn get(&self, id: RemoteId) -> Option<RemoteValue<T>> {
        self.entries.lock().get(&id).cloned()
    }

    pub(super) fn insert(&self, remote: RemoteValue<T>) {
        self.entries.lock().insert(remote.id(), remote);
    }

    pub(super) fn downgrade(&self) -> Weak<Entries<T>> {
        Arc::downgrade(&self.entries)
    }
}
