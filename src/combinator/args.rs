//! Argument lists for wrapped calls.
//!
//! Every argument is normalised into an [`Arg`]. A list of them is classified once per
//! call: all plain, some infected (carriers or external futures), or holding
//! lazy inputs. Infected lists are joined into a single carrier of the plain values.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;

use crate::carrier::{Carrier, Payload};
use crate::defect::{Cause, Defect};
use crate::lazy::Lazy;
use crate::meta::{merge_all, EffectMetadata};
use crate::tagged::Tagged;

use super::options::WrapOptions;

/// How a call's inputs affect evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Infection {
    /// Every input is a plain value.
    Plain,
    /// At least one input is a carrier or an external future.
    Infected,
    /// At least one input is unevaluated.
    Lazy,
}

/// One argument to a wrapped call.
///
/// Conversions exist from a plain `T`, a `Carrier<T, E>`, a `Lazy<T>`, a
/// `Lazy<Carrier<T, E>>` and, with the `async` feature, a `RemoteValue<T>`.
/// Other futures enter through [`Arg::external`].
pub enum Arg<T, E> {
    /// A plain value.
    Plain(T),
    /// A value already inside a carrier.
    Carrier(Carrier<T, E>),
    /// An unevaluated value.
    Lazy(Lazy<T>),
    /// A foreign future whose failure is a rejection.
    External(BoxFuture<'static, Result<T, Cause>>),
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Arg<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            Arg::Carrier(carrier) => f.debug_tuple("Carrier").field(carrier).finish(),
            Arg::Lazy(thunk) => f.debug_tuple("Lazy").field(thunk).finish(),
            Arg::External(_) => f.write_str("External(<future>)"),
        }
    }
}

impl<T, E> From<T> for Arg<T, E> {
    fn from(value: T) -> Self {
        Arg::Plain(value)
    }
}

impl<T, E> From<Carrier<T, E>> for Arg<T, E> {
    fn from(carrier: Carrier<T, E>) -> Self {
        Arg::Carrier(carrier)
    }
}

impl<T, E> From<Lazy<T>> for Arg<T, E> {
    fn from(thunk: Lazy<T>) -> Self {
        Arg::Lazy(thunk)
    }
}

impl<T, E> From<Lazy<Carrier<T, E>>> for Arg<T, E>
where
    T: Send + 'static,
    E: Tagged + Send + 'static,
{
    fn from(thunk: Lazy<Carrier<T, E>>) -> Self {
        Arg::Carrier(Carrier::deferred(thunk, EffectMetadata::variants_of::<E>()))
    }
}

impl<T, E> From<Lazy<Lazy<T>>> for Arg<T, E>
where
    T: Send + 'static,
{
    fn from(thunk: Lazy<Lazy<T>>) -> Self {
        Arg::Lazy(thunk.flatten())
    }
}

#[cfg(feature = "async")]
impl<T, E> From<crate::remote::RemoteValue<T>> for Arg<T, E>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(remote: crate::remote::RemoteValue<T>) -> Self {
        Arg::External(Box::pin(
            async move { remote.wait().await.map_err(Cause::from_error) },
        ))
    }
}

impl<T, E> Arg<T, E> {
    /// Adopt a foreign future. Its `Err` becomes a rejection defect.
    pub fn external<F, C>(future: F) -> Self
    where
        F: Future<Output = Result<T, C>> + Send + 'static,
        C: Into<Cause>,
    {
        Arg::External(Box::pin(future.map(|result| result.map_err(Into::into))))
    }

    /// This argument's contribution to the call's classification.
    pub fn infection(&self) -> Infection {
        match self {
            Arg::Plain(_) => Infection::Plain,
            Arg::Carrier(carrier) if carrier.is_deferred() => Infection::Lazy,
            Arg::Carrier(_) | Arg::External(_) => Infection::Infected,
            Arg::Lazy(_) => Infection::Lazy,
        }
    }
}

impl<T, E> Arg<T, E>
where
    T: Send + 'static,
    E: Tagged + From<Defect> + Send + 'static,
{
    /// Metadata known without evaluating anything.
    fn meta(&self, options: &WrapOptions<E>) -> EffectMetadata {
        match self {
            Arg::Plain(_) | Arg::Lazy(_) => EffectMetadata::new(),
            Arg::Carrier(carrier) => carrier.meta().clone(),
            Arg::External(_) => options.rejection_meta(),
        }
    }

    fn force(self) -> Self {
        match self {
            Arg::Lazy(thunk) => Arg::Plain(thunk.into_value()),
            Arg::Carrier(carrier) => Arg::Carrier(carrier.force()),
            other => other,
        }
    }

    fn into_carrier(self, options: &WrapOptions<E>) -> Carrier<T, E> {
        match self {
            Arg::Plain(value) => Carrier::ok(value),
            Arg::Carrier(carrier) => carrier,
            Arg::Lazy(thunk) => Carrier::ok(thunk.into_value()),
            Arg::External(future) => {
                let meta = options.rejection_meta();
                let options = options.clone();
                let future = async move { future.await.map_err(|cause| options.rejected(cause)) };
                Carrier::from_parts(Payload::Pending(Box::pin(future)), meta)
            }
        }
    }
}

/// A fixed list of arguments, joined into one carrier of plain values.
pub trait ArgList<E>: Send + Sized + 'static {
    /// The plain values handed to the handler.
    type Values: Send + 'static;

    /// The strongest classification among the arguments.
    fn infection(&self) -> Infection;

    /// Metadata known without evaluating anything.
    fn meta(&self, options: &WrapOptions<E>) -> EffectMetadata;

    /// The plain values, when every argument is plain.
    fn into_plain(self) -> Result<Self::Values, Self>;

    /// Evaluate every lazy argument.
    fn force(self) -> Self;

    /// Join every argument into one carrier.
    ///
    /// Metadata is the union over all arguments. When any argument is pending the
    /// result is pending and all of them are awaited concurrently; once all have
    /// settled the leftmost failure wins.
    fn join(self, options: &WrapOptions<E>) -> Carrier<Self::Values, E>;
}

/// Settle a carrier, turning a panic while awaiting into a rejection.
pub(crate) async fn guarded<T, E>(carrier: Carrier<T, E>, options: WrapOptions<E>) -> Result<T, E>
where
    T: Send + 'static,
    E: From<Defect> + Send + 'static,
{
    match AssertUnwindSafe(carrier.settle()).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(options.rejected(Cause::from_panic(panic))),
    }
}

fn settle_or_pend<V, E, F>(joined: F, meta: EffectMetadata, pending: bool) -> Carrier<V, E>
where
    F: Future<Output = Result<V, E>> + Send + 'static,
{
    let mut future: BoxFuture<'static, Result<V, E>> = Box::pin(joined);
    if !pending {
        if let Some(result) = (&mut future).now_or_never() {
            return Carrier::from_parts(Payload::Settled(result), meta);
        }
    }
    Carrier::from_parts(Payload::Pending(future), meta.with_async())
}

impl<E> ArgList<E> for ()
where
    E: Send + 'static,
{
    type Values = ();

    fn infection(&self) -> Infection {
        Infection::Plain
    }

    fn meta(&self, _options: &WrapOptions<E>) -> EffectMetadata {
        EffectMetadata::new()
    }

    fn into_plain(self) -> Result<(), Self> {
        Ok(())
    }

    fn force(self) -> Self {
        self
    }

    fn join(self, _options: &WrapOptions<E>) -> Carrier<(), E> {
        Carrier::ok(())
    }
}

macro_rules! impl_arg_list {
    ($($idx:tt $T:ident $X:ident $v:ident),+) => {
        impl<E, $($T),+> ArgList<E> for ($(Arg<$T, E>,)+)
        where
            E: Tagged + From<Defect> + Send + 'static,
            $($T: Send + 'static,)+
        {
            type Values = ($($T,)+);

            fn infection(&self) -> Infection {
                Infection::Plain $(.max(self.$idx.infection()))+
            }

            fn meta(&self, options: &WrapOptions<E>) -> EffectMetadata {
                merge_all([$(&self.$idx.meta(options)),+])
            }

            fn into_plain(self) -> Result<Self::Values, Self> {
                match self {
                    ($(Arg::Plain($v),)+) => Ok(($($v,)+)),
                    other => Err(other),
                }
            }

            fn force(self) -> Self {
                ($(self.$idx.force(),)+)
            }

            fn join(self, options: &WrapOptions<E>) -> Carrier<Self::Values, E> {
                let ($($v,)+) = ($(self.$idx.into_carrier(options),)+);
                let meta = merge_all([$($v.meta()),+]);
                let pending = false $(|| $v.is_pending())+;
                let options = options.clone();
                let joined = async move {
                    let ($($v,)+) = futures::join!($(guarded($v, options.clone())),+);
                    Ok::<_, E>(($($v?,)+))
                };
                settle_or_pend(joined, meta, pending)
            }
        }

        impl<E, $($T, $X),+> IntoArgs<E, ($($T,)+)> for ($($X,)+)
        where
            E: Tagged + From<Defect> + Send + 'static,
            $($T: Send + 'static, $X: Into<Arg<$T, E>>,)+
        {
            type List = ($(Arg<$T, E>,)+);

            fn into_args(self) -> Self::List {
                ($(self.$idx.into(),)+)
            }
        }
    };
}

impl_arg_list!(0 T1 X1 v1);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6, 6 T7 X7 v7);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6, 6 T7 X7 v7, 7 T8 X8 v8);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6, 6 T7 X7 v7, 7 T8 X8 v8, 8 T9 X9 v9);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6, 6 T7 X7 v7, 7 T8 X8 v8, 8 T9 X9 v9, 9 T10 X10 v10);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6, 6 T7 X7 v7, 7 T8 X8 v8, 8 T9 X9 v9, 9 T10 X10 v10, 10 T11 X11 v11);
impl_arg_list!(0 T1 X1 v1, 1 T2 X2 v2, 2 T3 X3 v3, 3 T4 X4 v4, 4 T5 X5 v5, 5 T6 X6 v6, 6 T7 X7 v7, 7 T8 X8 v8, 8 T9 X9 v9, 9 T10 X10 v10, 10 T11 X11 v11, 11 T12 X12 v12);

impl<T, E> ArgList<E> for Vec<Arg<T, E>>
where
    T: Send + 'static,
    E: Tagged + From<Defect> + Send + 'static,
{
    type Values = Vec<T>;

    fn infection(&self) -> Infection {
        self.iter()
            .map(Arg::infection)
            .fold(Infection::Plain, Infection::max)
    }

    fn meta(&self, options: &WrapOptions<E>) -> EffectMetadata {
        let records: Vec<EffectMetadata> = self.iter().map(|arg| arg.meta(options)).collect();
        merge_all(&records)
    }

    fn into_plain(self) -> Result<Vec<T>, Self> {
        if !self.iter().all(|arg| matches!(arg, Arg::Plain(_))) {
            return Err(self);
        }
        Ok(self
            .into_iter()
            .filter_map(|arg| match arg {
                Arg::Plain(value) => Some(value),
                _ => None,
            })
            .collect())
    }

    fn force(self) -> Self {
        self.into_iter().map(Arg::force).collect()
    }

    fn join(self, options: &WrapOptions<E>) -> Carrier<Vec<T>, E> {
        let carriers: Vec<Carrier<T, E>> = self
            .into_iter()
            .map(|arg| arg.into_carrier(options))
            .collect();
        let meta = merge_all(carriers.iter().map(Carrier::meta));
        let pending = carriers.iter().any(Carrier::is_pending);
        let options = options.clone();
        let joined = async move {
            join_all(carriers.into_iter().map(|c| guarded(c, options.clone())))
                .await
                .into_iter()
                .collect::<Result<Vec<T>, E>>()
        };
        settle_or_pend(joined, meta, pending)
    }
}

/// Caller-side inputs convertible into an [`ArgList`] producing `Values`.
///
/// Implemented for tuples whose elements each convert into an [`Arg`], for `()`, and
/// for `Vec`s of convertible elements.
pub trait IntoArgs<E, Values> {
    /// The normalised argument list.
    type List: ArgList<E, Values = Values>;

    /// Normalise every input.
    fn into_args(self) -> Self::List;
}

impl<E> IntoArgs<E, ()> for ()
where
    E: Send + 'static,
{
    type List = ();

    fn into_args(self) -> Self::List {}
}

impl<E, T, X> IntoArgs<E, Vec<T>> for Vec<X>
where
    T: Send + 'static,
    E: Tagged + From<Defect> + Send + 'static,
    X: Into<Arg<T, E>>,
{
    type List = Vec<Arg<T, E>>;

    fn into_args(self) -> Self::List {
        self.into_iter().map(Into::into).collect()
    }
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
        Defect(String),
    }

    impl Tagged for TestError {
        fn tag(&self) -> &'static str {
            match self {
                TestError::A => "A",
                TestError::B => "B",
                TestError::Defect(_) => "Defect",
            }
        }

        fn variants() -> &'static [&'static str] {
            &["A", "B", "Defect"]
        }
    }

    impl From<Defect> for TestError {
        fn from(defect: Defect) -> Self {
            TestError::Defect(defect.to_string())
        }
    }

    type Args2 = (Arg<i32, TestError>, Arg<i32, TestError>);

    #[test]
    fn test_classification() {
        let plain: Args2 = (1.into(), 2.into());
        assert_eq!(plain.infection(), Infection::Plain);

        let infected: Args2 = (ok(1).into(), 2.into());
        assert_eq!(infected.infection(), Infection::Infected);

        let deferred: Args2 = (ok(1).into(), lazy(|| 2).into());
        assert_eq!(deferred.infection(), Infection::Lazy);
    }

    #[test]
    fn test_settled_join_unions_meta() {
        let args: Args2 = (
            ok::<_, TestError>(1)
                .merge_meta(&EffectMetadata::failing("A"))
                .into(),
            ok::<_, TestError>(2)
                .merge_meta(&EffectMetadata::failing("B"))
                .into(),
        );
        let joined = args.join(&WrapOptions::new());
        assert_eq!(joined.peek(), Some(&Ok((1, 2))));
        assert!(joined.meta().declares("A") && joined.meta().declares("B"));
        assert!(!joined.meta().is_async());
    }

    #[test]
    fn test_leftmost_failure_wins_when_settled() {
        let args: Args2 = (err(TestError::B).into(), err(TestError::A).into());
        let joined = args.join(&WrapOptions::new());
        assert_eq!(joined.peek(), Some(&Err(TestError::B)));
    }

    #[tokio::test]
    async fn test_leftmost_failure_wins_when_pending() {
        let slow = Carrier::<i32, _>::pending(async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Err(TestError::A)
        });
        let args: Args2 = (slow.into(), err(TestError::B).into());
        let joined = args.join(&WrapOptions::new());
        assert!(joined.is_pending());
        assert!(joined.meta().is_async());
        assert_eq!(joined.settle().await, Err(TestError::A));
    }

    #[tokio::test]
    async fn test_external_rejection_is_mapped() {
        let args: (Arg<i32, TestError>,) = (Arg::external(async { Err::<i32, _>("offline") }),);
        let joined = args.join(&WrapOptions::new());
        // The rejection is declared under the tag the conversion gives it.
        assert!(joined.meta().declares("Defect"));
        assert!(!joined.meta().declares("PromiseRejected"));
        assert_eq!(
            joined.settle().await,
            Err(TestError::Defect("awaited value rejected: offline".into()))
        );
    }

    #[tokio::test]
    async fn test_panic_while_awaiting_is_rejection() {
        let exploding = Carrier::<i32, TestError>::pending(async { panic!("kaboom") });
        let args: (Arg<i32, TestError>,) = (exploding.into(),);
        let result = args.join(&WrapOptions::new()).settle().await;
        assert_eq!(
            result,
            Err(TestError::Defect("awaited value rejected: kaboom".into()))
        );
    }

    #[test]
    fn test_force_evaluates_lazy_args() {
        let args: Args2 = (lazy(|| 1).into(), lazy(|| ok::<i32, TestError>(2)).into());
        let forced = args.force();
        assert_ne!(forced.infection(), Infection::Lazy);
    }

    #[test]
    fn test_vec_join_preserves_order() {
        let args: Vec<Arg<i32, TestError>> = vec![1.into(), ok(2).into(), 3.into()];
        assert_eq!(args.infection(), Infection::Infected);
        let joined = args.join(&WrapOptions::new());
        assert_eq!(joined.peek(), Some(&Ok(vec![1, 2, 3])));
    }

    #[test]
    fn test_vec_into_plain() {
        let args: Vec<Arg<i32, TestError>> = vec![1.into(), 2.into()];
        assert_eq!(args.into_plain().ok(), Some(vec![1, 2]));
    }
}
