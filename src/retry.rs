use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use error_stack::{Context, Report};
use rand::Rng;

use crate::config::sheets_config::{
    GoogleSheetConfig, RETRY_ATTEMPTS, RETRY_MAX_WAIT, RETRY_MIN_WAIT,
};
use crate::sheets::error::SheetsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Abort,
}

/// Decides, per failure, whether another attempt is worth making.
pub type Classifier<C> = Arc<dyn Fn(&Report<C>) -> RetryDecision + Send + Sync>;

/// Retries every failure, including ones that cannot succeed (e.g. an unknown spreadsheet name).
pub fn retry_always() -> Classifier<SheetsError> {
    Arc::new(|_| RetryDecision::Retry)
}

/// Gives up right away on [`SheetsError::is_permanent`] errors.
pub fn abort_on_permanent() -> Classifier<SheetsError> {
    Arc::new(|report| {
        if report.current_context().is_permanent() {
            RetryDecision::Abort
        } else {
            RetryDecision::Retry
        }
    })
}

/// Bounded exponential backoff.
///
/// The wait after attempt `n` is `multiplier * 2^(n - 1)` seconds clamped to
/// `[min_wait, max_wait]`, plus up to `jitter` extra, never exceeding `max_wait`. With the
/// defaults that is 2, 2, 4 and 8 seconds between five attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub multiplier: f64,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_ATTEMPTS,
            min_wait: Duration::from_secs(RETRY_MIN_WAIT),
            max_wait: Duration::from_secs(RETRY_MAX_WAIT),
            multiplier: 1.0,
            jitter: Duration::ZERO,
        }
    }
}

impl From<&GoogleSheetConfig> for RetryPolicy {
    fn from(config: &GoogleSheetConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts,
            min_wait: config.retry_min_wait(),
            max_wait: config.retry_max_wait(),
            ..Self::default()
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Deterministic part of the wait after the given (1-based) attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.multiplier * 2f64.powi(exponent);
        let secs = secs
            .min(self.max_wait.as_secs_f64())
            .max(self.min_wait.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    fn wait_after(&self, attempt: u32) -> Duration {
        let wait = self.backoff(attempt);
        if self.jitter.is_zero() {
            return wait;
        }

        let extra = rand::thread_rng().gen_range(Duration::ZERO..=self.jitter);
        (wait + extra).min(self.max_wait.max(wait))
    }

    /// Runs `operation` until it succeeds, the classifier aborts, or `max_attempts` is reached.
    /// The error of the last attempt is returned with its context untouched.
    pub async fn run<T, C, F, Fut>(
        &self,
        classify: &Classifier<C>,
        mut operation: F,
    ) -> Result<T, Report<C>>
    where
        C: Context,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Report<C>>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let report = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(report) => report,
            };

            if attempt >= max_attempts {
                tracing::error!(attempt, max_attempts, "Giving up: {}", report);
                return Err(report
                    .attach_printable(format!("Gave up after {} attempt(s)", attempt)));
            }

            if classify(&report) == RetryDecision::Abort {
                tracing::error!(attempt, "Not retrying permanent failure: {}", report);
                return Err(report
                    .attach_printable(format!("Aborted after {} attempt(s)", attempt)));
            }

            let wait = self.wait_after(attempt);
            tracing::warn!(attempt, max_attempts, ?wait, "Retrying after backoff");
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        let waits = (1..=5).map(|n| policy.backoff(n)).collect::<Vec<_>>();
        assert_eq!(
            waits,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(10),
            ]
        );
    }

    #[test]
    fn test_backoff_is_capped_for_large_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(64), Duration::from_secs(10));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_never_exceeds_max_wait() {
        let policy = RetryPolicy::default().with_jitter(Duration::from_secs(5));
        for attempt in 1..=6 {
            let wait = policy.wait_after(attempt);
            assert!(wait >= policy.backoff(attempt));
            assert!(wait <= policy.max_wait);
        }
    }

    #[test]
    fn test_policy_from_config() {
        let config = GoogleSheetConfig {
            retry_attempts: 3,
            retry_min_wait: 1,
            retry_max_wait: 3,
            ..GoogleSheetConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(3), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = RetryPolicy::default()
            .run(&retry_always(), |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(Report::new(SheetsError::Api("rate limited".into())))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_gives_up_after_max_attempts_with_last_error() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let report = RetryPolicy::default()
            .run(&retry_always(), |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Err::<(), _>(Report::new(SheetsError::Api(format!("failure {}", attempt))))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            report.current_context(),
            &SheetsError::Api("failure 5".to_string())
        );
        // 2 + 2 + 4 + 8
        assert!(start.elapsed() >= Duration::from_secs(16));
        assert!(start.elapsed() < Duration::from_secs(17));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aborts_on_permanent_error() {
        let calls = AtomicU32::new(0);

        let report = RetryPolicy::default()
            .run(&abort_on_permanent(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(Report::new(SheetsError::SpreadsheetNotFound(
                        "Missing".into(),
                    )))
                }
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            report.current_context(),
            SheetsError::SpreadsheetNotFound(name) if name == "Missing"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = RetryPolicy::default()
            .with_max_attempts(0)
            .run(&retry_always(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Report::new(SheetsError::Api("down".into()))) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
