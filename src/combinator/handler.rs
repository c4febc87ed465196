//! Handler arities.
//!
//! Any `Fn` of up to twelve parameters is a [`Handler`] over the tuple of its parameter
//! types. The impls are generated the same way tuple `Semigroup` impls are; arbitrary
//! argument counts go through [`wrap_variadic`](crate::wrap_variadic) instead.

/// A callable taking its arguments as one tuple.
pub trait Handler<Args>: Send + Sync + 'static {
    /// What the handler returns.
    type Output;

    /// Invoke with unpacked arguments.
    fn call(&self, args: Args) -> Self::Output;
}

macro_rules! impl_handler {
    ($($T:ident),*) => {
        impl<F, R, $($T,)*> Handler<($($T,)*)> for F
        where
            F: Fn($($T),*) -> R + Send + Sync + 'static,
        {
            type Output = R;

            #[inline]
            #[allow(non_snake_case, clippy::unused_unit)]
            fn call(&self, args: ($($T,)*)) -> R {
                let ($($T,)*) = args;
                (self)($($T),*)
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
