//! Memoized lazy suspensions.
//!
//! A [`Lazy<T>`] holds a zero-argument computation and runs it at most once, on first
//! use. There are no implicit conversions in Rust, so "use" means calling the read-through
//! accessor [`Lazy::force`] (or consuming the value with [`Lazy::into_value`]). The
//! `Display` impl forces too, which covers string contexts.
//!
//! Laziness is infectious through [`wrap`](crate::wrap): a call that receives a lazy input
//! defers its whole evaluation into a deferred [`Carrier`](crate::Carrier).
//!
//! # Examples
//!
//! ```rust
//! use confluence::lazy;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = calls.clone();
//! let value = lazy(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     21 * 2
//! });
//!
//! assert_eq!(calls.load(Ordering::SeqCst), 0);
//! assert_eq!(*value.force(), 42);
//! assert_eq!(*value.force(), 42);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use std::cell::{Ref, RefCell};
use std::fmt;

type Thunk<T> = Box<dyn FnOnce() -> T + Send>;

/// The internal state of a `Lazy` value.
enum LazyState<T> {
    /// Not yet forced.
    Uninit(Thunk<T>),
    /// Forced; the cached result.
    Init(T),
    /// The thunk panicked, or is running and was re-entered.
    Poisoned,
}

/// A lazily evaluated value with memoization.
///
/// `Lazy<T>` is `Send` when `T` is, so it can travel into pending work, but it is not
/// `Sync`: forcing goes through a `RefCell`.
pub struct Lazy<T> {
    state: RefCell<LazyState<T>>,
}

impl<T> Lazy<T> {
    /// Suspend `thunk` until first use.
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Lazy {
            state: RefCell::new(LazyState::Uninit(Box::new(thunk))),
        }
    }

    /// An already-forced value.
    pub fn ready(value: T) -> Self {
        Lazy {
            state: RefCell::new(LazyState::Init(value)),
        }
    }

    /// Whether the thunk has run.
    pub fn is_forced(&self) -> bool {
        matches!(&*self.state.borrow(), LazyState::Init(_))
    }

    /// Force evaluation and borrow the cached result.
    ///
    /// The first call runs the thunk; later calls return the cached value.
    ///
    /// # Panics
    ///
    /// If the thunk panicked during an earlier force, or if the thunk forces its own
    /// `Lazy` while running.
    pub fn force(&self) -> Ref<'_, T> {
        let needs_initialization = matches!(&*self.state.borrow(), LazyState::Uninit(_));
        if needs_initialization {
            self.initialize();
        }

        Ref::map(self.state.borrow(), |state| match state {
            LazyState::Init(value) => value,
            _ => panic!("Lazy instance has been poisoned"),
        })
    }

    /// Force evaluation and take ownership of the result.
    ///
    /// # Panics
    ///
    /// If the lazy value is poisoned.
    pub fn into_value(self) -> T {
        match self.state.into_inner() {
            LazyState::Uninit(thunk) => {
                tracing::trace!("forcing lazy value");
                thunk()
            }
            LazyState::Init(value) => value,
            LazyState::Poisoned => panic!("Lazy instance has been poisoned"),
        }
    }

    /// Defer a transformation of the eventual value. Neither thunk runs until the result
    /// is forced.
    pub fn map<U, F>(self, f: F) -> Lazy<U>
    where
        T: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Lazy::new(move || f(self.into_value()))
    }

    fn initialize(&self) {
        let state = std::mem::replace(&mut *self.state.borrow_mut(), LazyState::Poisoned);
        match state {
            LazyState::Uninit(thunk) => {
                tracing::trace!("forcing lazy value");
                // Poisoned while the thunk runs; a panic leaves it that way.
                let value = thunk();
                *self.state.borrow_mut() = LazyState::Init(value);
            }
            other => *self.state.borrow_mut() = other,
        }
    }
}

impl<T: Send + 'static> Lazy<Lazy<T>> {
    /// Collapse one level of nesting; forcing the result forces both layers.
    pub fn flatten(self) -> Lazy<T> {
        Lazy::new(move || self.into_value().into_value())
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            LazyState::Init(value) => f.debug_tuple("Lazy").field(value).finish(),
            LazyState::Uninit(_) => f.write_str("Lazy(<unforced>)"),
            LazyState::Poisoned => f.write_str("Lazy(<poisoned>)"),
        }
    }
}

// String contexts force.
impl<T: fmt::Display> fmt::Display for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.force(), f)
    }
}

/// Suspend a zero-argument computation.
pub fn lazy<T, F>(thunk: F) -> Lazy<T>
where
    F: FnOnce() -> T + Send + 'static,
{
    Lazy::new(thunk)
}

/// Suspend a call of `handler` with already-collected arguments.
///
/// ```
/// use confluence::lazy_call;
///
/// let sum = lazy_call(|(a, b): (i32, i32)| a + b, (2, 3));
/// assert_eq!(sum.into_value(), 5);
/// ```
pub fn lazy_call<Args, T, F>(handler: F, args: Args) -> Lazy<T>
where
    Args: Send + 'static,
    F: FnOnce(Args) -> T + Send + 'static,
{
    Lazy::new(move || handler(args))
}
