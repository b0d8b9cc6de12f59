//! The rate-limited caller: every call into the data source goes through here.
//!
//! [`RateLimiter::call`] wraps one zero-argument unit of work. Before the work
//! is dispatched the budget of its [`BudgetClass`] is checked; when the budget
//! is at or below the configured threshold the call sleeps until the reported
//! reset time (plus a margin). Failures are retried with exponential back-off
//! according to [`DataSourceError::retry_policy`]; when the attempts are used
//! up, or the failure is not retryable, the caller receives `None`.
//!
//! Budgets are the only shared mutable state of a run. The check, the wait and
//! the decrement happen under one lock, so no dispatch proceeds on a budget
//! another dispatch has already used up.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use issues::{BudgetClass, DataSourceError, QuotaSnapshot, RepositoryDataSource, RetryPolicy, Timestamp};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Tuning of the rate-limited caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// A budget at or below this many remaining calls triggers a wait for reset.
    pub low_budget_threshold: u64,
    /// Added to the reported reset time before dispatching again.
    pub reset_margin: Duration,
    /// Consecutive failed attempts after which a call gives up.
    pub max_attempts: u32,
    /// Back-off after the first failed attempt; doubled for every further one.
    pub initial_backoff: Duration,
    /// Upper bound of the exponential back-off.
    pub max_backoff: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            low_budget_threshold: 10,
            reset_margin: Duration::from_secs(5),
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

/// Guards calls into a [`RepositoryDataSource`] with quota and retry policy.
pub struct RateLimiter {
    source: Arc<dyn RepositoryDataSource>,
    config: RateLimiterConfig,
    budgets: Mutex<HashMap<BudgetClass, QuotaSnapshot>>,
}

impl RateLimiter {
    pub fn new(source: Arc<dyn RepositoryDataSource>, config: RateLimiterConfig) -> Self {
        Self {
            source,
            config,
            budgets: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Returns the locally tracked budget of `class`, if any is known.
    pub async fn budget(&self, class: BudgetClass) -> Option<QuotaSnapshot> {
        self.budgets.lock().await.get(&class).copied()
    }

    /// Runs `work` under the budget of `class`.
    ///
    /// Returns `None` when the work could not be completed: a non-retryable
    /// failure, or `max_attempts` consecutive retryable failures. `operation`
    /// names the work in log events.
    pub async fn call<T, F, Fut>(&self, class: BudgetClass, operation: &str, mut work: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DataSourceError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.reserve(class).await;

            let result = work().await;
            self.observe(class).await;

            let err = match result {
                Ok(value) => return Some(value),
                Err(err) => err,
            };

            let after = match err.retry_policy() {
                RetryPolicy::NonRetryable => {
                    error!(operation, error = %err, "Guarded call failed; not retryable.");
                    return None;
                }
                RetryPolicy::Retryable { after } => after,
            };

            if attempt >= self.config.max_attempts {
                error!(
                    operation,
                    attempts = attempt,
                    error = %err,
                    "Guarded call failed; retry attempts exhausted."
                );
                return None;
            }

            let delay = self.backoff(attempt).max(after.unwrap_or_default());
            if let DataSourceError::RateLimited { class: limited, .. } = &err {
                // Stays at zero until `delay` has passed; reserve() refreshes it after.
                self.exhaust(*limited, delay).await;
                warn!(operation, attempt, budget = %limited, "Rate limited by host; waiting for reset.");
            }
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Guarded call failed; retrying."
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Exponential back-off for the given (1-based) failed attempt.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config
            .initial_backoff
            .saturating_mul(factor)
            .min(self.config.max_backoff)
    }

    /// Checks the budget of `class`, waits for its reset if it is running
    /// low, and takes one unit from it.
    async fn reserve(&self, class: BudgetClass) {
        let mut budgets = self.budgets.lock().await;

        let stale = budgets
            .get(&class)
            .map_or(true, |budget| budget.reset_at <= Timestamp::now());
        if stale {
            self.refresh(&mut budgets, class).await;
        }

        if let Some(budget) = budgets.get(&class).copied() {
            if budget.remaining <= self.config.low_budget_threshold {
                let wait = budget.reset_at.duration_from_now() + self.config.reset_margin;
                info!(
                    budget = %class,
                    remaining = budget.remaining,
                    reset_at = %budget.reset_at,
                    wait_secs = wait.as_secs(),
                    "Rate limit budget low; sleeping until reset."
                );
                tokio::time::sleep(wait).await;
                self.refresh(&mut budgets, class).await;
            }
        }

        if let Some(budget) = budgets.get_mut(&class) {
            budget.remaining = budget.remaining.saturating_sub(1);
        }
    }

    async fn refresh(&self, budgets: &mut HashMap<BudgetClass, QuotaSnapshot>, class: BudgetClass) {
        match self.source.remaining_quota(class).await {
            Ok(snapshot) => {
                debug!(budget = %class, remaining = snapshot.remaining, reset_at = %snapshot.reset_at, "Rate limit budget refreshed.");
                budgets.insert(class, snapshot);
            }
            Err(err) => {
                warn!(budget = %class, error = %err, "Rate limit budget unavailable; proceeding without it.");
                budgets.remove(&class);
            }
        }
    }

    /// Adopts the budget the data source observed on its last response.
    async fn observe(&self, class: BudgetClass) {
        if let Some(snapshot) = self.source.last_observed_quota(class) {
            self.budgets.lock().await.insert(class, snapshot);
        }
    }

    /// Zeroes the budget of `class` with its reset `until` from now.
    async fn exhaust(&self, class: BudgetClass, until: Duration) {
        let now = Timestamp::now().as_datetime();
        let reset_at = chrono::Duration::from_std(until)
            .ok()
            .and_then(|until| now.checked_add_signed(until))
            .unwrap_or(now);
        let mut budgets = self.budgets.lock().await;
        let limit = budgets.get(&class).map_or(0, |budget| budget.limit);
        budgets.insert(
            class,
            QuotaSnapshot {
                remaining: 0,
                limit,
                reset_at: Timestamp::from_utc(reset_at),
            },
        );
    }
}
