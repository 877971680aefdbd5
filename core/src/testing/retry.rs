use std::time::Duration;

use rjudge_client::{ExecutionOutcome, ExecutionRequest, Executor};

/// Delay before retry number `attempt + 1`: `base * 2^attempt`.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    2u32.checked_pow(attempt)
        .map_or(Duration::MAX, |factor| base.saturating_mul(factor))
}

/// Retries only on rate limiting; every other failure is final after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

    pub const RATE_LIMIT_EXCEEDED: &'static str = "Rate limit exceeded";
    pub const RETRIES_EXHAUSTED: &'static str = "Failed to execute after retries";

    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Never fails: transport errors come back as a failed outcome.
    pub async fn execute(&self, executor: &dyn Executor, req: &ExecutionRequest) -> ExecutionOutcome {
        for attempt in 0..=self.max_retries {
            match executor.execute(req).await {
                Ok(outcome) => return outcome,

                Err(e) if e.is_rate_limit() => {
                    if attempt >= self.max_retries {
                        log::warn!("Giving up after {} retries: {}", self.max_retries, e);
                        return ExecutionOutcome::failure(Self::RATE_LIMIT_EXCEEDED);
                    }
                    let wait = backoff_delay(attempt, self.base_delay);
                    log::debug!(
                        "Rate limit detected, waiting {:?} before retry {}/{}",
                        wait,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(wait).await;
                }

                Err(e) => return ExecutionOutcome::failure(e.to_string()),
            }
        }
        ExecutionOutcome::failure(Self::RETRIES_EXHAUSTED)
    }
}

#[cfg(test)]
mod test {
    use rjudge_client::{Error, StatusCode};

    use super::*;
    use crate::testing::mock::*;

    #[test]
    fn backoff_doubles() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff_delay(0, base), Duration::from_millis(250));
        assert_eq!(backoff_delay(1, base), Duration::from_millis(500));
        assert_eq!(backoff_delay(2, base), Duration::from_secs(1));
        assert_eq!(backoff_delay(3, base), Duration::from_secs(2));
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(backoff_delay(64, Duration::from_secs(1)), Duration::MAX);
    }

    fn req() -> ExecutionRequest {
        ExecutionRequest::new("cpp", "int main(){}", "")
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_rate_limits() {
        let exec = ScriptedExecutor::new([Err(rate_limited()), Err(rate_limited()), Ok(ok("42"))]);
        let policy = RetryPolicy::new(2, Duration::from_millis(100));

        let out = policy.execute(&exec, &req()).await;
        assert!(out.success);
        assert_eq!(out.stdout, "42");

        let calls = exec.calls();
        assert_eq!(calls.len(), 3);
        let first_wait = calls[1] - calls[0];
        let second_wait = calls[2] - calls[1];
        assert!(first_wait >= Duration::from_millis(100), "{:?}", first_wait);
        assert!(second_wait >= Duration::from_millis(200), "{:?}", second_wait);
        assert!(second_wait > first_wait);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_is_exhausted() {
        let exec = ScriptedExecutor::new([
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
        ]);
        let policy = RetryPolicy::new(2, Duration::from_millis(100));

        let out = policy.execute(&exec, &req()).await;
        assert!(!out.success);
        assert_eq!(
            out.runtime_error.as_deref(),
            Some(RetryPolicy::RATE_LIMIT_EXCEEDED)
        );
        assert_eq!(exec.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn other_failures_are_not_retried() {
        let exec = ScriptedExecutor::new([Err(server_error())]);
        let out = RetryPolicy::default().execute(&exec, &req()).await;

        assert!(!out.success);
        assert_eq!(out.runtime_error, Some(server_error().to_string()));
        assert_eq!(exec.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_on_port_4290_is_not_retried() {
        let err = || Error::UnexpectedResponseCode {
            got: StatusCode::INTERNAL_SERVER_ERROR,
            requested_url: "http://piston.local:4290/api/v2/execute".into(),
        };
        let exec = ScriptedExecutor::new([Err(err()), Ok(ok("late"))]);
        let out = RetryPolicy::default().execute(&exec, &req()).await;

        assert_eq!(out.runtime_error, Some(err().to_string()));
        assert_ne!(out.runtime_error.as_deref(), Some(RetryPolicy::RATE_LIMIT_EXCEEDED));
        assert_eq!(exec.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn final_outcomes_are_not_retried() {
        let compile_failed = ExecutionOutcome {
            compile_error: Some("syntax error".into()),
            ..Default::default()
        };
        let exec = ScriptedExecutor::new([Ok(compile_failed.clone())]);
        let out = RetryPolicy::default().execute(&exec, &req()).await;

        assert_eq!(out, compile_failed);
        assert_eq!(exec.calls().len(), 1);
    }
}
