//! Retry policy for backend requests.
//!
//! Responses with a retryable status are re-sent with exponential backoff.
//! The attempt counter lives in each call to [`RetryPolicy::run`], so the
//! backoff restarts from the initial interval for every logical request.

use std::future::Future;
use std::time::Duration;

use catalog_search_shared::Cancellation;
use tracing::{debug, warn};

/// Statuses worth retrying: bad gateway, service unavailable, gateway
/// timeout and too many requests.
pub const RETRY_ON_STATUS: [u16; 4] = [502, 503, 504, 429];

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Exponential backoff applied to retryable backend responses.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound for a single delay.
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_interval: Duration::from_millis(500),
            multiplier: 1.5,
            max_interval: Duration::from_secs(60),
        }
    }
}

/// A response together with the number of retries it took.
#[derive(Debug)]
pub struct Retried<T> {
    pub response: T,
    pub retries: u32,
}

impl RetryPolicy {
    /// Whether a response status belongs to a retryable class.
    pub fn is_retryable_status(status: u16) -> bool {
        RETRY_ON_STATUS.contains(&status)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            return self.max_interval;
        }
        Duration::from_secs_f64(secs)
    }

    /// Send a request, re-sending it while the response status is retryable
    /// and retries remain.
    ///
    /// Transport errors are returned as-is. Once `cancel` fires no further
    /// retries are attempted and the latest response is returned.
    pub async fn run<T, E, F, Fut, S>(
        &self,
        operation: &str,
        cancel: Option<&Cancellation>,
        mut send: F,
        status_of: S,
    ) -> Result<Retried<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        S: Fn(&T) -> u16,
    {
        let mut retries = 0;

        loop {
            let response = send().await?;
            let status = status_of(&response);

            if !Self::is_retryable_status(status) || retries >= self.max_retries {
                if retries > 0 {
                    debug!(operation = %operation, status, retries, "Request finished after retries");
                }
                return Ok(Retried { response, retries });
            }

            let delay = self.backoff(retries + 1);
            warn!(
                operation = %operation,
                status,
                retry = retries + 1,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retryable response, backing off"
            );

            match cancel {
                Some(cancel) => {
                    if cancel.is_cancelled() {
                        return Ok(Retried { response, retries });
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            debug!(operation = %operation, "Run cancelled, not retrying");
                            return Ok(Retried { response, retries });
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }

            retries += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(100),
            multiplier: 2.0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [502, 503, 504, 429] {
            assert!(RetryPolicy::is_retryable_status(status));
        }
        for status in [200, 201, 400, 404, 409, 500] {
            assert!(!RetryPolicy::is_retryable_status(status));
        }
    }

    #[test]
    fn test_backoff_grows_until_capped() {
        let policy = RetryPolicy {
            max_interval: Duration::from_millis(700),
            ..fast_policy()
        };

        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(700));
        assert_eq!(policy.backoff(u32::MAX), Duration::from_millis(700));
    }

    #[test]
    fn test_default_backoff_is_increasing() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = (1..=5).map(|retry| policy.backoff(retry)).collect();

        assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Replays `statuses` in order, recording when each attempt was made.
    fn scripted(
        statuses: Vec<u16>,
    ) -> (
        Arc<Mutex<Vec<Instant>>>,
        impl FnMut() -> std::future::Ready<Result<u16, Infallible>>,
    ) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let recorded = attempts.clone();
        let mut statuses = statuses.into_iter();
        let send = move || {
            recorded.lock().unwrap().push(Instant::now());
            std::future::ready(Ok(statuses.next().unwrap_or(200)))
        };
        (attempts, send)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let (attempts, send) = scripted(vec![503, 503, 200]);

        let retried = fast_policy()
            .run("search", None, send, |status| *status)
            .await
            .unwrap();

        assert_eq!(retried.response, 200);
        assert_eq!(retried.retries, 2);

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 3);
        let first_gap = attempts[1] - attempts[0];
        let second_gap = attempts[2] - attempts[1];
        assert!(first_gap < second_gap);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let (attempts, send) = scripted(vec![429; 10]);

        let retried = fast_policy()
            .run("bulk", None, send, |status| *status)
            .await
            .unwrap();

        assert_eq!(retried.response, 429);
        assert_eq!(retried.retries, DEFAULT_MAX_RETRIES);
        assert_eq!(attempts.lock().unwrap().len(), DEFAULT_MAX_RETRIES as usize + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_returns_immediately() {
        let (attempts, send) = scripted(vec![400, 200]);

        let retried = fast_policy()
            .run("search", None, send, |status| *status)
            .await
            .unwrap();

        assert_eq!(retried.response, 400);
        assert_eq!(retried.retries, 0);
        assert_eq!(attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_call_restarts_backoff() {
        let policy = fast_policy();

        for _ in 0..2 {
            let (attempts, send) = scripted(vec![502, 200]);
            policy.run("search", None, send, |status| *status).await.unwrap();

            let attempts = attempts.lock().unwrap();
            let gap = attempts[1] - attempts[0];
            assert!(gap >= Duration::from_millis(100) && gap < Duration::from_millis(200));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_retrying() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let (attempts, send) = scripted(vec![503, 200]);

        let retried = fast_policy()
            .run("bulk", Some(&cancel), send, |status| *status)
            .await
            .unwrap();

        assert_eq!(retried.response, 503);
        assert_eq!(attempts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<Retried<u16>, &str> = fast_policy()
            .run(
                "search",
                None,
                || {
                    calls += 1;
                    std::future::ready(Err("connection refused"))
                },
                |status| *status,
            )
            .await;

        assert_eq!(result.unwrap_err(), "connection refused");
        assert_eq!(calls, 1);
    }
}
