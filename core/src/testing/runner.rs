use std::sync::Arc;

use rjudge_client::{ExecutionRequest, Executor};
use tokio::time::Instant;

use super::{
    ratelimit::RateLimiter, result::JudgedResult, retry::RetryPolicy, testcase::AsyncTestcase,
};

/// The program under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub language: String,
    pub source: String,
}

impl Submission {
    pub fn new(language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
        }
    }

    fn request(&self, stdin: String) -> ExecutionRequest {
        ExecutionRequest::new(self.language.clone(), self.source.clone(), stdin)
    }
}

/// Judges one testcase at a time against a shared limiter.
#[derive(Clone)]
pub struct CaseRunner {
    submission: Arc<Submission>,
    executor: Arc<dyn Executor>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl CaseRunner {
    pub fn new(
        submission: Arc<Submission>,
        executor: Arc<dyn Executor>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            submission,
            executor,
            limiter,
            retry,
        }
    }

    /// Always yields a result; load and transport failures are recorded in it.
    pub async fn run<T>(&self, testcase: &T) -> JudgedResult
    where
        T: AsyncTestcase + ?Sized,
    {
        let start_at = Instant::now();

        let loaded = tokio::try_join!(testcase.load_input(), testcase.load_expected());
        let (input, expected) = match loaded {
            Ok(x) => x,
            Err(e) => {
                log::warn!("Testcase {}: {}", testcase.name(), e);
                return JudgedResult::not_executed(
                    testcase.index(),
                    testcase.name(),
                    e.to_string(),
                    start_at.elapsed(),
                );
            }
        };

        let req = self.submission.request(input);

        let (outcome, api_execution_time) = {
            let permit = match self.limiter.acquire().await {
                Ok(p) => p,
                Err(e) => {
                    return JudgedResult::not_executed(
                        testcase.index(),
                        testcase.name(),
                        format!("Rate limiter closed: {}", e),
                        start_at.elapsed(),
                    )
                }
            };
            let api_start_at = Instant::now();
            log::debug!("Testcase {}: dispatching", testcase.name());
            let outcome = self.retry.execute(self.executor.as_ref(), &req).await;
            let elapsed = api_start_at.elapsed();
            drop(permit);
            (outcome, elapsed)
        };

        let ExecutionRequest { stdin: input, .. } = req;
        JudgedResult::new(
            testcase.index(),
            testcase.name(),
            input,
            expected,
            outcome,
            start_at.elapsed(),
            api_execution_time,
        )
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;
    use crate::testing::{
        mock::*,
        ratelimit::RateLimits,
        result::JudgeCode,
        testcase::{FsTestcase, OnMemoryTestcase},
    };

    const HELLO_CPP: &str = r#"
#include <iostream>
int main() {
    int num;
    std::cin >> num;
    for (int i = 0; i < num; i++) std::cout << "Hello" << std::endl;
}
"#;

    fn runner(executor: Arc<dyn Executor>, source: &str) -> CaseRunner {
        CaseRunner::new(
            Arc::new(Submission::new("cpp", source)),
            executor,
            Arc::new(RateLimiter::new(RateLimits::default())),
            RetryPolicy::new(2, Duration::from_millis(10)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn hello_n_times_passes() {
        let exec = Arc::new(HelloExecutor::new(|_| Duration::from_millis(40)));
        let t = OnMemoryTestcase::new(1, "input1", "5\n", "Hello\nHello\nHello\nHello\nHello");

        let res = runner(exec, HELLO_CPP).run(&t).await;

        assert_eq!(res.judge, JudgeCode::AC);
        assert!(res.overall_success);
        assert!(res.output_match);
        assert_eq!(res.input, "5\n");
        assert_eq!(res.index, 1);
        assert_eq!(res.name, "input1");
        assert!(res.api_execution_time >= Duration::from_millis(40));
        assert!(res.execution_time >= res.api_execution_time);
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_blank_lines_still_match() {
        let exec = Arc::new(ScriptedExecutor::new([Ok(ok("42\n\n"))]));
        let t = OnMemoryTestcase::new(1, "input1", "", "42");

        let res = runner(exec, "").run(&t).await;
        assert!(res.overall_success);
    }

    #[tokio::test(start_paused = true)]
    async fn compile_error_wins_over_run_output() {
        let exec = Arc::new(HelloExecutor::new(|_| Duration::ZERO));
        let t = OnMemoryTestcase::new(1, "input1", "0\n", "");

        let res = runner(exec, "syntax error").run(&t).await;

        assert_eq!(res.judge, JudgeCode::CE);
        assert_eq!(res.outcome.compile_error.as_deref(), Some("syntax error"));
        assert!(!res.overall_success);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_is_recorded() {
        let exec = Arc::new(ScriptedExecutor::new([Err(server_error())]));
        let t = OnMemoryTestcase::new(3, "input3", "1\n", "1");

        let res = runner(exec, "").run(&t).await;

        assert_eq!(res.judge, JudgeCode::RE);
        assert_eq!(res.index, 3);
        assert!(res.outcome.runtime_error.is_some());
        assert!(!res.overall_success);
    }

    #[tokio::test]
    async fn missing_file_is_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("input1.txt"), "1\n").unwrap();
        let t = FsTestcase::new(
            1,
            "input1",
            tmp.path().join("input1.txt"),
            tmp.path().join("output1.txt"),
        );
        let exec = Arc::new(ScriptedExecutor::new([]));

        let res = runner(exec.clone(), "").run(&t).await;

        assert_eq!(res.judge, JudgeCode::RE);
        let msg = res.outcome.runtime_error.unwrap();
        assert!(msg.contains("output1.txt"), "{}", msg);
        assert!(exec.calls().is_empty());
    }
}
