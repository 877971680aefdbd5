use std::{sync::Arc, time::Duration};

use rjudge_client::Executor;
use tokio::time::Instant;

use super::{
    ratelimit::{RateLimiter, RateLimits},
    result::{JudgedResult, RunSummary},
    retry::RetryPolicy,
    runner::{CaseRunner, Submission},
    testcase::AsyncTestcase,
};

/// Called once for each testcase as soon as it is judged.
pub type ProgressSink = Arc<dyn Fn(&JudgedResult) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Ordered by testcase index.
    pub results: Vec<JudgedResult>,
    pub total_time: Duration,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results, self.total_time)
    }
}

pub struct Orchestrator {
    submission: Arc<Submission>,
    executor: Arc<dyn Executor>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    progress: Option<ProgressSink>,
}

impl Orchestrator {
    pub fn new(submission: Submission, executor: Arc<dyn Executor>, limits: RateLimits) -> Self {
        Self {
            submission: Arc::new(submission),
            executor,
            limiter: Arc::new(RateLimiter::new(limits)),
            retry: RetryPolicy::default(),
            progress: None,
        }
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&JudgedResult) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }

    /// Judges every testcase concurrently and returns exactly one result per testcase.
    ///
    /// Runs on one orchestrator are expected to happen one after another.
    pub async fn run_all<T>(&self, testcases: Vec<T>) -> RunReport
    where
        T: AsyncTestcase + 'static,
    {
        let start_at = Instant::now();

        self.limiter.reset().await;
        let runner = CaseRunner::new(
            self.submission.clone(),
            self.executor.clone(),
            self.limiter.clone(),
            self.retry,
        );

        let handles: Vec<_> = testcases
            .into_iter()
            .map(|t| {
                let runner = runner.clone();
                let progress = self.progress.clone();
                let (index, name) = (t.index(), t.name().to_owned());
                let handle = tokio::spawn(async move {
                    let res = runner.run(&t).await;
                    if let Some(f) = progress {
                        f(&res);
                    }
                    res
                });
                (index, name, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (index, name, handle) in handles {
            let res = handle.await.unwrap_or_else(|e| {
                log::error!("Testcase {} aborted: {}", name, e);
                JudgedResult::not_executed(
                    index,
                    name,
                    format!("Testcase task aborted: {}", e),
                    start_at.elapsed(),
                )
            });
            results.push(res);
        }
        results.sort_by_key(|r| r.index);

        RunReport {
            results,
            total_time: start_at.elapsed(),
        }
    }
}
