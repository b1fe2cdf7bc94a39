use crate::error::{AggregateError, AttemptError, Result, WaystoneError};
use crate::operation::Operation;
use crate::route::StickyRoute;
use crate::types::{AttemptResult, Endpoint, EndpointPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Runs one round: the sticky endpoint alone, then (if needed) every endpoint
/// in parallel, first success wins.
#[derive(Debug, Clone)]
pub struct FanoutRacer {
    pool: Arc<EndpointPool>,
    route: Arc<StickyRoute>,
}

impl FanoutRacer {
    pub fn new(pool: Arc<EndpointPool>, route: Arc<StickyRoute>) -> Result<Self> {
        if route.pool_len() != pool.len() {
            return Err(WaystoneError::Config(format!(
                "Sticky route sized for {} endpoints, pool has {}",
                route.pool_len(),
                pool.len()
            )));
        }
        Ok(Self { pool, route })
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn route(&self) -> &Arc<StickyRoute> {
        &self.route
    }

    pub async fn race<O: Operation>(
        &self,
        op: &Arc<O>,
        timeout: Duration,
    ) -> std::result::Result<AttemptResult<O::Output>, AggregateError> {
        if let Some(endpoint) = self.route.get().and_then(|i| self.pool.get(i)) {
            // Own task so a panic is contained and dropping the race aborts it.
            let mut sticky = JoinSet::new();
            let sticky_op = Arc::clone(op);
            let sticky_endpoint = endpoint.clone();
            sticky.spawn(async move { attempt_once(&*sticky_op, sticky_endpoint, timeout).await });
            let outcome = match sticky.join_next().await {
                Some(Ok(result)) => result,
                Some(Err(join_err)) => Err(AttemptError::Transport(format!(
                    "attempt task failed: {}",
                    join_err
                ))),
                None => Err(AttemptError::Transport("attempt task missing".into())),
            };

            match outcome {
                Ok(value) => {
                    tracing::debug!("[{}] sticky endpoint {} succeeded", op.name(), endpoint);
                    self.route.set(endpoint.index());
                    return Ok(AttemptResult {
                        value,
                        endpoint: endpoint.clone(),
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        "[{}] sticky endpoint {} failed: {}, racing all {} endpoints",
                        op.name(),
                        endpoint,
                        e,
                        self.pool.len()
                    );
                }
            }
        }

        let mut attempts = JoinSet::new();
        for endpoint in self.pool.iter() {
            let op = Arc::clone(op);
            let endpoint = endpoint.clone();
            attempts.spawn(async move {
                let result = attempt_once(&*op, endpoint.clone(), timeout).await;
                (endpoint, result)
            });
        }

        let mut last = None;
        while let Some(joined) = attempts.join_next().await {
            match joined {
                Ok((endpoint, Ok(value))) => {
                    // Stragglers are irrelevant now; free them.
                    attempts.abort_all();

                    let previous = self.route.get();
                    self.route.set(endpoint.index());
                    if previous != Some(endpoint.index()) {
                        tracing::info!(
                            "[{}] routing to {} (was {:?})",
                            op.name(),
                            endpoint,
                            previous.and_then(|i| self.pool.get(i)).map(|e| e.base_url())
                        );
                    }
                    return Ok(AttemptResult { value, endpoint });
                }
                Ok((endpoint, Err(e))) => {
                    tracing::debug!("[{}] attempt against {} failed: {}", op.name(), endpoint, e);
                    last = Some(e);
                }
                Err(join_err) => {
                    tracing::warn!("[{}] attempt task aborted: {}", op.name(), join_err);
                    last = Some(AttemptError::Transport(format!(
                        "attempt task failed: {}",
                        join_err
                    )));
                }
            }
        }

        Err(AggregateError {
            endpoints_tried: self.pool.len(),
            last,
        })
    }
}

async fn attempt_once<O: Operation>(
    op: &O,
    endpoint: Endpoint,
    timeout: Duration,
) -> std::result::Result<O::Output, AttemptError> {
    match tokio::time::timeout(timeout, op.attempt(endpoint)).await {
        Ok(result) => result,
        Err(_) => Err(AttemptError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::operation_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn racer(addrs: &[&str]) -> FanoutRacer {
        let pool = Arc::new(EndpointPool::new(addrs.iter().copied()).unwrap());
        let route = Arc::new(StickyRoute::new(pool.len()));
        FanoutRacer::new(pool, route).unwrap()
    }

    fn counters(n: usize) -> Arc<Vec<AtomicUsize>> {
        Arc::new((0..n).map(|_| AtomicUsize::new(0)).collect())
    }

    #[test]
    fn test_rejects_mismatched_route() {
        let pool = Arc::new(EndpointPool::new(["http://x", "http://y"]).unwrap());
        let route = Arc::new(StickyRoute::new(3));
        assert!(FanoutRacer::new(pool, route).is_err());
    }

    #[tokio::test]
    async fn test_first_success_updates_route() {
        let racer = racer(&["http://x", "http://y"]);
        let op = Arc::new(operation_fn("only-y", |ep: Endpoint| async move {
            if ep.index() == 1 {
                Ok("from-y")
            } else {
                Err(AttemptError::Transport("connection refused".into()))
            }
        }));

        let won = racer.race(&op, TIMEOUT).await.unwrap();
        assert_eq!(won.value, "from-y");
        assert_eq!(won.endpoint.index(), 1);
        assert_eq!(racer.route().get(), Some(1));
    }

    #[tokio::test]
    async fn test_sticky_fast_path_skips_fanout() {
        let racer = racer(&["http://x", "http://y", "http://z"]);
        racer.route().set(2);

        let calls = counters(3);
        let seen = Arc::clone(&calls);
        let op = Arc::new(operation_fn("ok", move |ep: Endpoint| {
            seen[ep.index()].fetch_add(1, Ordering::SeqCst);
            async move { Ok(ep.index()) }
        }));

        let won = racer.race(&op, TIMEOUT).await.unwrap();
        assert_eq!(won.value, 2);
        assert_eq!(calls[0].load(Ordering::SeqCst), 0);
        assert_eq!(calls[1].load(Ordering::SeqCst), 0);
        assert_eq!(calls[2].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_sticky_falls_back_to_full_race() {
        let racer = racer(&["http://x", "http://y"]);
        racer.route().set(0);

        let calls = counters(2);
        let seen = Arc::clone(&calls);
        let op = Arc::new(operation_fn("x-down", move |ep: Endpoint| {
            seen[ep.index()].fetch_add(1, Ordering::SeqCst);
            async move {
                match ep.index() {
                    0 => Err(AttemptError::Status(502)),
                    _ => Ok("L2"),
                }
            }
        }));

        let won = racer.race(&op, TIMEOUT).await.unwrap();
        assert_eq!(won.value, "L2");
        assert_eq!(racer.route().get(), Some(1));
        // Once alone, once more in the full race.
        assert_eq!(calls[0].load(Ordering::SeqCst), 2);
        assert_eq!(calls[1].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_fail_reports_aggregate() {
        let racer = racer(&["http://x", "http://y", "http://z"]);
        let op = Arc::new(operation_fn("down", |_ep: Endpoint| async move {
            Err::<(), _>(AttemptError::Rejected("device not registered".into()))
        }));

        let err = racer.race(&op, TIMEOUT).await.unwrap_err();
        assert_eq!(err.endpoints_tried, 3);
        assert_eq!(
            err.last,
            Some(AttemptError::Rejected("device not registered".into()))
        );
        assert_eq!(racer.route().get(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let racer = racer(&["http://x"]);
        let op = Arc::new(operation_fn("hang", |_ep: Endpoint| async move {
            std::future::pending::<()>().await;
            Ok(())
        }));

        let err = racer.race(&op, TIMEOUT).await.unwrap_err();
        assert_eq!(err.endpoints_tried, 1);
        assert_eq!(err.last, Some(AttemptError::Timeout(TIMEOUT)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fastest_success_wins_over_slow_one() {
        let racer = racer(&["http://slow", "http://fast"]);
        let op = Arc::new(operation_fn("latency", |ep: Endpoint| async move {
            let delay = if ep.index() == 0 { 800 } else { 50 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(ep.index())
        }));

        let won = racer.race(&op, TIMEOUT).await.unwrap();
        assert_eq!(won.value, 1);
        assert_eq!(racer.route().get(), Some(1));
    }

    #[tokio::test]
    async fn test_panicking_attempt_is_a_failure() {
        let racer = racer(&["http://x", "http://y"]);
        let op = Arc::new(operation_fn("panicky", |ep: Endpoint| async move {
            if ep.index() == 0 {
                panic!("boom");
            }
            Err::<(), _>(AttemptError::Status(500))
        }));

        let err = racer.race(&op, TIMEOUT).await.unwrap_err();
        assert_eq!(err.endpoints_tried, 2);
        assert!(err.last.is_some());
    }

    #[tokio::test]
    async fn test_panicking_sticky_attempt_falls_back_to_full_race() {
        let racer = racer(&["http://x", "http://y"]);
        racer.route().set(0);

        let calls = counters(2);
        let seen = Arc::clone(&calls);
        let op = Arc::new(operation_fn("panics-once", move |ep: Endpoint| {
            let nth = seen[ep.index()].fetch_add(1, Ordering::SeqCst);
            async move {
                if ep.index() == 0 && nth == 0 {
                    panic!("boom");
                }
                Ok::<_, AttemptError>(ep.index())
            }
        }));

        let won = racer.race(&op, TIMEOUT).await.unwrap();
        assert!(won.value < 2);
        assert_eq!(racer.route().get(), Some(won.value));
        assert_eq!(calls[0].load(Ordering::SeqCst), 2);
    }
}
