//! Property-based tests for the metadata algebra and the combinator's guarantees

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use confluence::{
    err, lazy, lift, ok, wrap_variadic, Arg, Carrier, Defect, EffectMetadata, Lazy, Monoid, Pure,
    Semigroup, Tag, Tagged,
};
use proptest::prelude::*;

const TAGS: &[Tag] = &["A", "B", "C", "D"];

fn metadata() -> impl Strategy<Value = EffectMetadata> {
    (any::<bool>(), prop::sample::subsequence(TAGS, 0..=TAGS.len())).prop_map(|(is_async, tags)| {
        let meta = tags
            .into_iter()
            .fold(EffectMetadata::new(), EffectMetadata::with_variant);
        if is_async {
            meta.with_async()
        } else {
            meta
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
struct Positional(usize);

impl Tagged for Positional {
    fn tag(&self) -> &'static str {
        TAGS[self.0 % TAGS.len()]
    }

    fn variants() -> &'static [Tag] {
        TAGS
    }
}

impl From<Defect> for Positional {
    fn from(_: Defect) -> Self {
        Positional(usize::MAX)
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_merge_is_associative(a in metadata(), b in metadata(), c in metadata()) {
        let left = a.clone().combine(b.clone()).combine(c.clone());
        let right = a.combine(b.combine(c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_merge_is_commutative(a in metadata(), b in metadata()) {
        prop_assert_eq!(a.merge(&b), b.merge(&a));
    }

    #[test]
    fn prop_empty_is_identity(a in metadata()) {
        prop_assert_eq!(a.clone().combine(EffectMetadata::empty()), a.clone());
        prop_assert_eq!(EffectMetadata::empty().combine(a.clone()), a);
    }

    #[test]
    fn prop_merge_is_idempotent(a in metadata()) {
        prop_assert_eq!(a.merge(&a), a);
    }

    #[test]
    fn prop_narrow_removes_exactly_handled(a in metadata(), handled in prop::sample::subsequence(TAGS, 0..=TAGS.len())) {
        let narrowed = a.clone().narrow(handled.iter().copied());
        prop_assert_eq!(narrowed.is_async(), a.is_async());
        for tag in TAGS {
            let expected = a.declares(tag) && !handled.contains(tag);
            prop_assert_eq!(narrowed.declares(tag), expected);
        }
    }

    #[test]
    fn prop_call_metadata_is_union_of_inputs(metas in prop::collection::vec(metadata(), 1..6)) {
        let sum = wrap_variadic::<_, _, _, Positional>(|xs: Vec<i32>| Pure(xs.len()));
        let inputs: Vec<Carrier<i32, Positional>> =
            metas.iter().map(|meta| ok(0).merge_meta(meta)).collect();
        let expected = metas
            .iter()
            .fold(EffectMetadata::empty(), |acc, meta| acc.merge(meta));

        let out = sum.call(inputs);
        prop_assert_eq!(out.meta(), &expected);
    }

    #[test]
    fn prop_failed_input_never_runs_handler(len in 1usize..8, failing in 0usize..8) {
        let failing = failing % len;
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handler = wrap_variadic::<_, _, _, Positional>(move |xs: Vec<usize>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Pure(xs.len())
        });

        let inputs: Vec<Carrier<usize, Positional>> = (0..len)
            .map(|i| if i == failing { err(Positional(i)) } else { ok(i) })
            .collect();
        let out = handler.call(inputs);

        prop_assert_eq!(out.peek(), Some(&Err(Positional(failing))));
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_leftmost_pending_failure_wins(delays in prop::collection::vec(0u64..4, 2..5)) {
        let handler = wrap_variadic::<_, _, _, Positional>(|xs: Vec<usize>| Pure(xs.len()));
        let count = delays.len();
        let inputs: Vec<Carrier<usize, Positional>> = delays
            .into_iter()
            .enumerate()
            .map(|(i, delay)| {
                // Later positions settle first.
                let wait = Duration::from_millis(delay + (count - i) as u64);
                Carrier::pending(async move {
                    tokio::time::sleep(wait).await;
                    Err(Positional(i))
                })
            })
            .collect();

        let settled = runtime().block_on(handler.call(inputs).settle());
        prop_assert_eq!(settled, Err(Positional(0)));
    }

    #[test]
    fn prop_unread_lazy_is_never_forced(read in any::<bool>(), value in any::<i32>()) {
        let forced = Arc::new(AtomicUsize::new(0));
        let counter = forced.clone();
        let pick = lift::<_, _, Positional>(|read: bool, thunk: Lazy<i32>| {
            if read {
                Some(thunk.into_value())
            } else {
                None
            }
        });

        let thunk = lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            value
        });
        let out = pick.call((ok(read), Arg::Plain(thunk)));

        let expected = if read { Some(value) } else { None };
        prop_assert_eq!(out.peek(), Some(&Ok(expected)));
        prop_assert_eq!(forced.load(Ordering::SeqCst), usize::from(read));
    }
}
