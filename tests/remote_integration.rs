//! Integration tests for remote values feeding wrapped handlers

use std::time::Duration;

use confluence::{
    lift, matching, ok, Arms, Carrier, Defect, Registry, RemoteError, RemoteOptions, RemoteValue,
    Tagged,
};

#[derive(Debug, Clone, PartialEq)]
enum ServiceError {
    Defect(Defect),
}

impl Tagged for ServiceError {
    fn tag(&self) -> &'static str {
        match self {
            ServiceError::Defect(defect) => defect.tag(),
        }
    }

    fn variants() -> &'static [&'static str] {
        Defect::variants()
    }
}

impl From<Defect> for ServiceError {
    fn from(defect: Defect) -> Self {
        ServiceError::Defect(defect)
    }
}

#[tokio::test]
async fn test_remote_value_as_handler_input() {
    let total = lift::<_, _, ServiceError>(|price: u32, quantity: u32| price * quantity);
    let price: RemoteValue<u32> = RemoteValue::new();

    let out = total.call((price.clone(), ok(3)));
    assert!(out.is_pending());
    assert!(out.meta().is_async());
    assert!(out.meta().declares("PromiseRejected"));

    let filler = tokio::spawn({
        let price = price.clone();
        async move { price.fill(14) }
    });
    assert_eq!(filler.await.ok(), Some(true));
    assert_eq!(out.settle().await, Ok(42));
}

#[tokio::test]
async fn test_failed_remote_value_becomes_rejection() {
    let double = lift::<_, _, ServiceError>(|n: u32| n * 2);
    let input: RemoteValue<u32> = RemoteValue::new();
    let out = double.call((input.clone(),));
    assert!(input.fail("upstream closed"));

    let message = matching(out)
        .with(
            Arms::ok(|n: u32| format!("got {}", n))
                .on("PromiseRejected", |e: ServiceError| format!("rejected: {:?}", e))
                .on("UnknownException", |e: ServiceError| format!("crashed: {:?}", e)),
        )
        .await;
    assert!(message.starts_with("rejected:"));
    assert!(message.contains("upstream closed"));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_rejects_with_timeout_tag() {
    let remote: RemoteValue<String> =
        RemoteValue::with_options(RemoteOptions::new().with_timeout(Duration::from_millis(5)));

    let failure = remote.clone().await.err();
    assert_eq!(failure.as_ref().map(Tagged::tag), Some("Timeout"));
    assert!(matches!(failure, Some(RemoteError::Timeout { after }) if after == Duration::from_millis(5)));
    assert!(!remote.fill("late".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_input_surfaces_through_handler() {
    let echo = lift::<_, _, ServiceError>(|s: String| s);
    let remote: RemoteValue<String> =
        RemoteValue::with_options(RemoteOptions::new().with_timeout(Duration::from_millis(5)));

    let out: Carrier<String, ServiceError> = echo.call((remote,));
    match out.settle().await {
        Err(ServiceError::Defect(defect)) => {
            assert!(defect.is_rejection());
            assert!(defect.cause().to_string().contains("not settled within"));
        }
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_registry_settles_from_distant_task() {
    let registry: Registry<u64> = Registry::new();
    let pending: Vec<RemoteValue<u64>> = (0..3)
        .map(|_| RemoteValue::with_options(RemoteOptions::new().with_registry(registry.clone())))
        .collect();
    assert_eq!(registry.len(), 3);

    let ids: Vec<_> = pending.iter().map(RemoteValue::id).collect();
    let responder = tokio::spawn({
        let registry = registry.clone();
        async move {
            for (n, id) in ids.into_iter().enumerate() {
                if n == 1 {
                    registry.reject_by_id(id, "denied");
                } else {
                    registry.resolve_by_id(id, n as u64 * 100);
                }
            }
        }
    });
    let _ = responder.await;

    assert_eq!(pending[0].wait().await, Ok(0));
    assert!(pending[1].wait().await.is_err());
    assert_eq!(pending[2].wait().await, Ok(200));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_concurrent_settlement_single_winner() {
    let registry: Registry<usize> = Registry::new();
    let remote = RemoteValue::with_options(RemoteOptions::new().with_registry(registry.clone()));
    let id = remote.id();

    let attempts: Vec<_> = (0..8)
        .map(|n| {
            let registry = registry.clone();
            let remote = remote.clone();
            tokio::spawn(async move {
                if n % 2 == 0 {
                    remote.fill(n)
                } else {
                    registry.resolve_by_id(id, n)
                }
            })
        })
        .collect();

    let mut wins = 0;
    for attempt in attempts {
        if attempt.await.unwrap_or(false) {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
    let winner = remote.wait().await;
    assert!(winner.is_ok());
    assert_eq!(remote.peek(), Some(winner));
}
