//! The wrapping combinator.
//!
//! [`wrap`] turns a handler over plain values into a function accepting plain values,
//! carriers, lazy thunks and futures in any mix. For one call:
//!
//! 1. If every input is plain, the handler runs directly and its result is re-wrapped.
//! 2. If any input is lazy, nothing runs; a deferred carrier is returned whose forcing
//!    performs steps 1 and 3.
//! 3. Otherwise the inputs are joined. The first failure in argument order
//!    short-circuits the call and the handler never runs. If any input is pending the
//!    result is pending.
//!
//! The result's metadata is the union of every input's metadata, the declared
//! metadata of the handler, and whatever the handler's own result carries. When the
//! handler runs only after the result exists (a pending or deferred call), the result
//! declares up front every variant the handler's outcome type can carry plus the tags
//! both kinds of defect convert to.
//!
//! A lazy input bound to a by-value parameter is forced when the deferred result is
//! forced, whether or not the handler reads it. Take a [`Lazy`] parameter instead to
//! leave the decision to the handler; such an input is passed through unforced and
//! does not defer the call.
//!
//! Panics inside a handler become `UnknownException` defects; panics while awaiting
//! and rejected external futures become `PromiseRejected` defects. Both can be mapped
//! to a domain error through [`WrapOptions`].

mod args;
mod handler;
mod options;
mod outcome;

pub use args::{Arg, ArgList, Infection, IntoArgs};
pub use handler::Handler;
pub use options::WrapOptions;
pub use outcome::{Outcome, Pure};

use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;

use crate::carrier::{Carrier, Payload};
use crate::defect::{Cause, Defect};
use crate::lazy::Lazy;
use crate::meta::EffectMetadata;
use crate::semigroup::Semigroup;
use crate::tagged::Tagged;

use args::guarded;

type Invoke<Args, B, E> = Arc<dyn Fn(Args, &WrapOptions<E>) -> Carrier<B, E> + Send + Sync>;

/// A wrapped handler. Created by [`wrap`], [`wrap_async`], [`lift`] or
/// [`wrap_variadic`]; invoked with [`Wrapped::call`].
pub struct Wrapped<Args, B, E> {
    invoke: Invoke<Args, B, E>,
    options: WrapOptions<E>,
    // Variants the handler's outcome type may carry.
    outcome: EffectMetadata,
    name: Option<&'static str>,
}

impl<Args, B, E> Clone for Wrapped<Args, B, E> {
    fn clone(&self) -> Self {
        Wrapped {
            invoke: self.invoke.clone(),
            options: self.options.clone(),
            outcome: self.outcome.clone(),
            name: self.name,
        }
    }
}

impl<Args, B, E> fmt::Debug for Wrapped<Args, B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl<Args, B, E> Wrapped<Args, B, E>
where
    Args: Send + 'static,
    B: Send + 'static,
    E: Tagged + From<Defect> + Send + 'static,
{
    fn from_invoke(invoke: Invoke<Args, B, E>, outcome: EffectMetadata) -> Self {
        Wrapped {
            invoke,
            options: WrapOptions::new(),
            outcome,
            name: None,
        }
    }

    /// Name used in log events.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Replace the options wholesale.
    pub fn with_options(mut self, options: WrapOptions<E>) -> Self {
        self.options = options;
        self
    }

    /// See [`WrapOptions::map_rejected`].
    pub fn map_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(Cause) -> E + Send + Sync + 'static,
    {
        self.options = self.options.map_rejected(f);
        self
    }

    /// See [`WrapOptions::map_thrown`].
    pub fn map_thrown<F>(mut self, f: F) -> Self
    where
        F: Fn(Cause) -> E + Send + Sync + 'static,
    {
        self.options = self.options.map_thrown(f);
        self
    }

    /// See [`WrapOptions::map_defect`].
    pub fn map_defect<F>(mut self, f: F) -> Self
    where
        F: Fn(Defect) -> E + Send + Sync + 'static,
    {
        self.options = self.options.map_defect(f);
        self
    }

    /// See [`WrapOptions::declare`].
    pub fn declare(mut self, tag: crate::meta::Tag) -> Self {
        self.options = self.options.declare(tag);
        self
    }

    /// The options this handler was wrapped with.
    pub fn options(&self) -> &WrapOptions<E> {
        &self.options
    }

    /// Invoke with any mix of plain values, carriers, lazy thunks and futures.
    ///
    /// Always returns a carrier. A fully plain call with a plain handler yields a
    /// settled carrier with empty metadata; see [`Carrier::try_plain`].
    pub fn call<I>(&self, inputs: I) -> Carrier<B, E>
    where
        I: IntoArgs<E, Args>,
    {
        self.run(inputs.into_args())
    }

    fn run<L>(&self, args: L) -> Carrier<B, E>
    where
        L: ArgList<E, Values = Args>,
    {
        match args.infection() {
            Infection::Plain => match args.into_plain() {
                Ok(values) => self.apply(values),
                Err(args) => self.bind(args.join(&self.options)),
            },
            Infection::Infected => self.bind(args.join(&self.options)),
            Infection::Lazy => self.defer(args),
        }
    }

    fn apply(&self, values: Args) -> Carrier<B, E> {
        (self.invoke)(values, &self.options).merge_meta(self.options.declared())
    }

    /// What the handler may contribute when it runs after the result already exists.
    fn late_meta(&self) -> EffectMetadata {
        self.outcome
            .clone()
            .combine(self.options.defect_meta())
            .combine(self.options.declared().clone())
    }

    fn defer<L>(&self, args: L) -> Carrier<B, E>
    where
        L: ArgList<E, Values = Args>,
    {
        let meta = args.meta(&self.options).combine(self.late_meta());
        tracing::trace!(wrapped = self.label(), %meta, "deferring call with lazy inputs");
        let this = self.clone();
        let thunk = Lazy::new(move || match catch_unwind(AssertUnwindSafe(|| args.force())) {
            Ok(args) => this.run(args),
            Err(panic) => {
                let error = this.options.thrown(Cause::from_panic(panic));
                Carrier::err(error).merge_meta(this.options.declared())
            }
        });
        Carrier::deferred(thunk, meta)
    }

    fn bind(&self, joined: Carrier<Args, E>) -> Carrier<B, E> {
        let (payload, meta) = joined.into_parts();
        let meta = match payload {
            Payload::Settled(_) => meta.combine(self.options.declared().clone()),
            _ => meta.combine(self.late_meta()),
        };

        match payload {
            Payload::Settled(Ok(values)) => self.apply(values).merge_meta(&meta),
            Payload::Settled(Err(error)) => {
                self.short_circuit(&error);
                Carrier::from_parts(Payload::Settled(Err(error)), meta)
            }
            Payload::Pending(future) => {
                let this = self.clone();
                let future = async move {
                    let values = match future.await {
                        Ok(values) => values,
                        Err(error) => {
                            this.short_circuit(&error);
                            return Err(error);
                        }
                    };
                    let carrier = this.apply(values);
                    guarded(carrier, this.options.clone()).await
                };
                Carrier::from_parts(Payload::Pending(Box::pin(future)), meta.with_async())
            }
            Payload::Deferred(thunk) => {
                let this = self.clone();
                Carrier::deferred((*thunk).map(move |inner| this.bind(inner)), meta)
            }
        }
    }

    fn short_circuit(&self, error: &E) {
        tracing::debug!(
            wrapped = self.label(),
            tag = error.tag(),
            "input failed; skipping handler"
        );
    }

    fn label(&self) -> &'static str {
        self.name.unwrap_or("<anonymous>")
    }
}

fn invoke_guarded<H, Args, E, O>(
    handler: &H,
    args: Args,
    options: &WrapOptions<E>,
) -> Result<O, E>
where
    H: Handler<Args, Output = O>,
    E: From<Defect>,
{
    catch_unwind(AssertUnwindSafe(|| handler.call(args)))
        .map_err(|panic| options.thrown(Cause::from_panic(panic)))
}

/// Wrap a handler returning a [`Result`], a [`Carrier`], a [`Lazy`] outcome or a
/// [`Pure`] value.
///
/// # Example
///
/// ```
/// use confluence::{err, ok, wrap, Carrier, Defect, Tagged};
///
/// #[derive(Debug, PartialEq)]
/// enum MathError {
///     DivideByZero,
///     Defect(String),
/// }
///
/// impl Tagged for MathError {
///     fn tag(&self) -> &'static str {
///         match self {
///             MathError::DivideByZero => "DivideByZero",
///             MathError::Defect(_) => "Defect",
///         }
///     }
///
///     fn variants() -> &'static [&'static str] {
///         &["DivideByZero", "Defect"]
///     }
/// }
///
/// impl From<Defect> for MathError {
///     fn from(defect: Defect) -> Self {
///         MathError::Defect(defect.to_string())
///     }
/// }
///
/// let divide = wrap(|a: i32, b: i32| {
///     if b == 0 {
///         Err(MathError::DivideByZero)
///     } else {
///         Ok(a / b)
///     }
/// });
///
/// assert_eq!(divide.call((ok(10), 2)).peek(), Some(&Ok(5)));
///
/// let failed = divide.call((7, 0));
/// assert!(failed.meta().declares("DivideByZero"));
///
/// // The handler never sees a failed input.
/// let skipped: Carrier<i32, MathError> = divide.call((err(MathError::DivideByZero), 1));
/// assert_eq!(skipped.peek(), Some(&Err(MathError::DivideByZero)));
/// ```
pub fn wrap<Args, H, E>(handler: H) -> Wrapped<Args, <H::Output as Outcome<E>>::Value, E>
where
    Args: Send + 'static,
    H: Handler<Args>,
    H::Output: Outcome<E>,
    E: Tagged + From<Defect> + Send + 'static,
{
    Wrapped::from_invoke(
        Arc::new(move |args: Args, options: &WrapOptions<E>| {
            match invoke_guarded(&handler, args, options) {
                Ok(outcome) => outcome.into_carrier(),
                Err(error) => Carrier::err(error),
            }
        }),
        <H::Output as Outcome<E>>::variants(),
    )
}

/// Wrap a handler returning a future of an [`Outcome`].
///
/// The result is always pending and marked asynchronous. It declares every variant the
/// outcome type can carry, plus the tag a rejection converts to (`PromiseRejected`
/// with the default conversion), which is what a panic while awaiting becomes.
pub fn wrap_async<Args, H, Fut, E>(
    handler: H,
) -> Wrapped<Args, <Fut::Output as Outcome<E>>::Value, E>
where
    Args: Send + 'static,
    H: Handler<Args, Output = Fut>,
    Fut: Future + Send + 'static,
    Fut::Output: Outcome<E>,
    E: Tagged + From<Defect> + Send + 'static,
{
    Wrapped::from_invoke(
        Arc::new(move |args: Args, options: &WrapOptions<E>| {
            let future = match invoke_guarded(&handler, args, options) {
                Ok(future) => future,
                Err(error) => return Carrier::err(error),
            };
            let meta = options
                .rejection_meta()
                .combine(<Fut::Output as Outcome<E>>::variants());
            let options = options.clone();
            let settled = async move {
                match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(outcome) => guarded(outcome.into_carrier(), options).await,
                    Err(panic) => Err(options.rejected(Cause::from_panic(panic))),
                }
            };
            Carrier::from_parts(Payload::Pending(Box::pin(settled)), meta)
        }),
        <Fut::Output as Outcome<E>>::variants(),
    )
}

/// Wrap a handler returning a plain value.
///
/// ```
/// use confluence::{lift, ok, Carrier, Defect};
///
/// let greet = lift(|name: String| format!("hello {}", name));
/// let out: Carrier<String, Defect> = greet.call((ok("ada".to_string()),));
/// assert_eq!(out.peek(), Some(&Ok("hello ada".to_string())));
/// ```
pub fn lift<Args, H, E>(handler: H) -> Wrapped<Args, H::Output, E>
where
    Args: Send + 'static,
    H: Handler<Args>,
    H::Output: Send + 'static,
    E: Tagged + From<Defect> + Send + 'static,
{
    Wrapped::from_invoke(
        Arc::new(move |args: Args, options: &WrapOptions<E>| {
            match invoke_guarded(&handler, args, options) {
                Ok(value) => Carrier::ok(value),
                Err(error) => Carrier::err(error),
            }
        }),
        EffectMetadata::new(),
    )
}

/// Wrap a handler over any number of arguments of one type.
///
/// ```
/// use confluence::{ok, wrap_variadic, Carrier, Defect, Pure};
///
/// let sum = wrap_variadic(|xs: Vec<i32>| Pure(xs.iter().sum::<i32>()));
/// let out: Carrier<i32, Defect> = sum.call(vec![ok(1), ok(2), ok(3)]);
/// assert_eq!(out.peek(), Some(&Ok(6)));
/// ```
pub fn wrap_variadic<T, H, O, E>(handler: H) -> Wrapped<Vec<T>, O::Value, E>
where
    T: Send + 'static,
    H: Fn(Vec<T>) -> O + Send + Sync + 'static,
    O: Outcome<E>,
    E: Tagged + From<Defect> + Send + 'static,
{
    Wrapped::from_invoke(
        Arc::new(move |args: Vec<T>, options: &WrapOptions<E>| {
            match catch_unwind(AssertUnwindSafe(|| handler(args))) {
                Ok(outcome) => outcome.into_carrier(),
                Err(panic) => Carrier::err(options.thrown(Cause::from_panic(panic))),
            }
        }),
        O::variants(),
    )
}
