use std::fmt;
use std::future::Future;

use tracing::{debug, warn};

use crate::core::{Attempt, Classify, RetryClass};
use crate::data::RetryPolicy;

impl RetryPolicy {
    /// Drive `op` until it succeeds, fails non-transiently, or the attempt
    /// budget is spent.
    ///
    /// Only [`RetryClass::Transient`] failures are retried. On exhaustion the
    /// last transient error is returned unchanged. The backoff sleep holds no
    /// locks, so it only delays this operation.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let mut attempt = Attempt::first();
        loop {
            let delay = self.delay_before(attempt.number);
            if let Some(prior) = &attempt.last_error {
                warn!(
                    "attempt {}/{} after {:?}; previous attempt failed: {}",
                    attempt.number,
                    self.max_attempts(),
                    delay,
                    prior
                );
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let err = match op(attempt.clone()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            match err.retry_class() {
                RetryClass::Transient if attempt.number < self.max_attempts() => {
                    debug!("attempt {} failed transiently: {}", attempt.number, err);
                    attempt = attempt.next(err.to_string());
                }
                RetryClass::Transient => {
                    warn!("giving up after {} attempts: {}", attempt.number, err);
                    return Err(err);
                }
                RetryClass::FatalHttp | RetryClass::Fatal => {
                    debug!("attempt {} failed permanently: {}", attempt.number, err);
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    struct Failure(RetryClass, u32);

    impl Classify for Failure {
        fn retry_class(&self) -> RetryClass { self.0 }
    }

    impl fmt::Display for Failure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?} on attempt {}", self.0, self.1)
        }
    }

    fn policy(max_attempts: u32, base_ms: u64, factor: f64) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(base_ms), factor).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_exhaustion_follows_backoff() {
        let started = Instant::now();
        let seen = Mutex::new(Vec::new());

        let result: Result<(), Failure> = policy(3, 100, 2.0)
            .run(|attempt| {
                seen.lock().unwrap().push((attempt.number, started.elapsed()));
                async move { Err(Failure(RetryClass::Transient, attempt.number)) }
            })
            .await;

        assert_eq!(result, Err(Failure(RetryClass::Transient, 3)));
        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                (1, Duration::ZERO),
                (2, Duration::from_millis(100)),
                (3, Duration::from_millis(300)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_http_is_not_retried() {
        let mut calls = 0;
        let result: Result<(), Failure> = policy(5, 100, 2.0)
            .run(|attempt| {
                calls += 1;
                async move { Err(Failure(RetryClass::FatalHttp, attempt.number)) }
            })
            .await;

        assert_eq!(result, Err(Failure(RetryClass::FatalHttp, 1)));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_after_transient_stops_immediately() {
        let mut calls = 0;
        let result: Result<(), Failure> = policy(5, 10, 2.0)
            .run(|attempt| {
                calls += 1;
                let class = if attempt.number == 1 {
                    RetryClass::Transient
                } else {
                    RetryClass::Fatal
                };
                async move { Err(Failure(class, attempt.number)) }
            })
            .await;

        assert_eq!(result, Err(Failure(RetryClass::Fatal, 2)));
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_and_passes_last_error() {
        let mut last_errors = Vec::new();
        let result: Result<u32, Failure> = policy(4, 50, 2.0)
            .run(|attempt| {
                last_errors.push(attempt.last_error.clone());
                async move {
                    if attempt.number < 3 {
                        Err(Failure(RetryClass::Transient, attempt.number))
                    } else {
                        Ok(attempt.number)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(
            last_errors,
            vec![
                None,
                Some("Transient on attempt 1".to_string()),
                Some("Transient on attempt 2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let mut calls = 0;
        let result: Result<(), Failure> = RetryPolicy::once()
            .run(|attempt| {
                calls += 1;
                async move { Err(Failure(RetryClass::Transient, attempt.number)) }
            })
            .await;

        assert_eq!(result, Err(Failure(RetryClass::Transient, 1)));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_base_delay_does_not_sleep() {
        let started = Instant::now();
        let result: Result<(), Failure> = policy(4, 0, 3.0)
            .run(|attempt| async move { Err(Failure(RetryClass::Transient, attempt.number)) })
            .await;

        assert_eq!(result, Err(Failure(RetryClass::Transient, 4)));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
