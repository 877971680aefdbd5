use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use rjudge_client::{Error, ExecutionOutcome, ExecutionRequest, Executor, StatusCode};
use tokio::time::Instant;

pub fn rate_limited() -> Error {
    Error::RateLimited {
        requested_url: "http://localhost:2000/api/v2/execute".into(),
    }
}

pub fn server_error() -> Error {
    Error::UnexpectedResponseCode {
        got: StatusCode::INTERNAL_SERVER_ERROR,
        requested_url: "http://localhost:2000/api/v2/execute".into(),
    }
}

pub fn ok(stdout: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        stdout: stdout.into(),
        success: true,
        ..Default::default()
    }
}

/// Replays a fixed sequence of responses and records when each call happened.
pub struct ScriptedExecutor {
    script: Mutex<VecDeque<rjudge_client::Result<ExecutionOutcome>>>,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedExecutor {
    pub fn new(script: impl IntoIterator<Item = rjudge_client::Result<ExecutionOutcome>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, _req: &ExecutionRequest) -> rjudge_client::Result<ExecutionOutcome> {
        self.calls.lock().unwrap().push(Instant::now());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted")
    }
}

/// Prints "Hello" as many times as the number on stdin, after a per-call latency.
/// Tracks how many calls are in flight at once.
pub struct HelloExecutor {
    latency: Box<dyn Fn(&ExecutionRequest) -> Duration + Send + Sync>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub dispatches: Mutex<Vec<Instant>>,
}

impl HelloExecutor {
    pub fn new(latency: impl Fn(&ExecutionRequest) -> Duration + Send + Sync + 'static) -> Self {
        Self {
            latency: Box::new(latency),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            dispatches: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Executor for HelloExecutor {
    async fn execute(&self, req: &ExecutionRequest) -> rjudge_client::Result<ExecutionOutcome> {
        self.dispatches.lock().unwrap().push(Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep((self.latency)(req)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if req.source.contains("syntax error") {
            return Ok(ExecutionOutcome {
                compile_error: Some("syntax error".into()),
                ..Default::default()
            });
        }
        let n: usize = req.stdin.trim().parse().unwrap_or(0);
        Ok(ok(&"Hello\n".repeat(n)))
    }
}
