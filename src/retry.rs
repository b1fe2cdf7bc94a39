use crate::error::{AggregateError, Result, WaystoneError};
use crate::notify::{LogNotifier, Notifier};
use crate::operation::Operation;
use crate::racer::FanoutRacer;
use crate::route::StickyRoute;
use crate::types::{AttemptResult, Endpoint, EndpointPool};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> u32 {
    2
}

/// Bounded retry with exponential backoff between rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-attempt bound, applied to every endpoint individually.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            timeout_ms: default_timeout_ms(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Delay slept after failed round `attempt` (1-based): base, base*m, base*m^2, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let factor = (self.backoff_multiplier as u64).saturating_pow(exp);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(WaystoneError::Config(
                "max_attempts must be at least 1".into(),
            ));
        }
        if self.backoff_multiplier == 0 {
            return Err(WaystoneError::Config(
                "backoff_multiplier must be at least 1".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(WaystoneError::Config("timeout_ms must be non-zero".into()));
        }
        Ok(())
    }
}

/// Decides whether a failed round is worth another one.
pub type RetryClassifier = fn(&AggregateError) -> bool;

/// Every failure is retryable, whatever its cause.
pub fn retry_always(_: &AggregateError) -> bool {
    true
}

/// Wraps the racer in the retry loop and surfaces one consolidated outcome.
pub struct RetryCoordinator {
    racer: FanoutRacer,
    policy: RetryPolicy,
    classifier: RetryClassifier,
    notifier: Arc<dyn Notifier>,
}

impl RetryCoordinator {
    pub fn new(pool: EndpointPool, policy: RetryPolicy) -> Result<Self> {
        let route = Arc::new(StickyRoute::new(pool.len()));
        Self::with_shared_route(Arc::new(pool), route, policy)
    }

    /// Build over an existing sticky route, so several coordinators learn from
    /// each other's successes.
    pub fn with_shared_route(
        pool: Arc<EndpointPool>,
        route: Arc<StickyRoute>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            racer: FanoutRacer::new(pool, route)?,
            policy,
            classifier: retry_always,
            notifier: Arc::new(LogNotifier),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_classifier(mut self, classifier: RetryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        self.racer.pool()
    }

    pub fn route(&self) -> &Arc<StickyRoute> {
        self.racer.route()
    }

    pub fn sticky_endpoint(&self) -> Option<Endpoint> {
        self.route()
            .get()
            .and_then(|i| self.pool().get(i))
            .cloned()
    }

    pub async fn execute<O: Operation>(&self, op: O) -> Result<O::Output> {
        self.execute_routed(op).await.map(AttemptResult::into_value)
    }

    /// Like [`execute`](Self::execute) but hands the user-facing notifier
    /// `notice` once if the retry budget runs out.
    pub async fn execute_primary<O: Operation>(&self, op: O, notice: &str) -> Result<O::Output> {
        match self.execute(op).await {
            Err(e) if e.is_exhausted() => {
                self.notifier.notify(notice);
                Err(e)
            }
            other => other,
        }
    }

    /// Dropping the returned future cancels any in-flight round or backoff sleep.
    pub async fn execute_routed<O: Operation>(&self, op: O) -> Result<AttemptResult<O::Output>> {
        let op = Arc::new(op);
        let timeout = self.policy.timeout();
        let mut attempt = 1;

        loop {
            let cause = match self.racer.race(&op, timeout).await {
                Ok(won) => {
                    if attempt > 1 {
                        tracing::info!(
                            "[{}] succeeded via {} on attempt {}/{}",
                            op.name(),
                            won.endpoint,
                            attempt,
                            self.policy.max_attempts
                        );
                    }
                    return Ok(won);
                }
                Err(cause) => cause,
            };

            if attempt >= self.policy.max_attempts || !(self.classifier)(&cause) {
                tracing::warn!(
                    "[{}] giving up after {} attempts: {}",
                    op.name(),
                    attempt,
                    cause
                );
                return Err(WaystoneError::Exhausted {
                    attempts: attempt,
                    cause,
                });
            }

            let delay = self.policy.backoff_delay(attempt);
            tracing::warn!(
                "[{}] attempt {}/{} failed ({}), retrying in {:?}",
                op.name(),
                attempt,
                self.policy.max_attempts,
                cause,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
