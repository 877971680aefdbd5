use std::{collections::BTreeMap, time::Duration};

use rjudge_client::ExecutionOutcome;
use serde::{Serialize, Serializer};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum::Display,
)]
pub enum JudgeCode {
    AC,
    WA,
    RE,
    CE,
}

impl JudgeCode {
    /// Priority: compile error > runtime error > output mismatch > success.
    pub fn classify(outcome: &ExecutionOutcome, output_match: bool) -> Self {
        use JudgeCode::*;
        if outcome.compile_error.is_some() {
            CE
        } else if outcome.runtime_error.is_some() || !outcome.success {
            // includes a nonzero exit that wrote to stderr
            RE
        } else if !output_match {
            WA
        } else {
            AC
        }
    }

    pub fn reason(self) -> &'static str {
        use JudgeCode::*;
        match self {
            AC => "Success",
            WA => "Output mismatch",
            RE => "Runtime error",
            CE => "Compilation error",
        }
    }
}

pub const OUTPUT_MATCHES: &str = "Output matches expected result";

pub fn normalize_output(s: &str) -> &str {
    s.trim_end()
}

/// Compares after dropping trailing whitespace; nothing else is normalized.
pub fn compare_outputs(actual: &str, expected: &str) -> (bool, String) {
    let actual = normalize_output(actual);
    let expected = normalize_output(expected);
    if actual == expected {
        (true, OUTPUT_MATCHES.to_owned())
    } else {
        (
            false,
            format!(
                "Output mismatch\nExpected:\n{}\n\nGot:\n{}",
                expected, actual
            ),
        )
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Final verdict for one testcase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgedResult {
    pub index: usize,
    pub name: String,
    pub judge: JudgeCode,
    pub input: String,
    pub expected_output: String,
    #[serde(flatten)]
    pub outcome: ExecutionOutcome,
    pub output_match: bool,
    pub comparison_msg: String,
    pub overall_success: bool,
    #[serde(serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub api_execution_time: Duration,
}

impl JudgedResult {
    pub fn new(
        index: usize,
        name: impl Into<String>,
        input: String,
        expected_output: String,
        outcome: ExecutionOutcome,
        execution_time: Duration,
        api_execution_time: Duration,
    ) -> Self {
        let (output_match, comparison_msg) = compare_outputs(&outcome.stdout, &expected_output);
        let overall_success =
            outcome.success && output_match && outcome.compile_error.is_none();
        Self {
            index,
            name: name.into(),
            judge: JudgeCode::classify(&outcome, output_match),
            input,
            expected_output,
            outcome,
            output_match,
            comparison_msg,
            overall_success,
            execution_time,
            api_execution_time,
        }
    }

    /// A testcase that never reached the execution service.
    pub fn not_executed(
        index: usize,
        name: impl Into<String>,
        reason: impl Into<String>,
        execution_time: Duration,
    ) -> Self {
        Self::new(
            index,
            name,
            String::new(),
            String::new(),
            ExecutionOutcome::failure(reason),
            execution_time,
            Duration::ZERO,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub judge_counts: BTreeMap<JudgeCode, usize>,
    #[serde(serialize_with = "serialize_secs")]
    pub total_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub total_execution_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub avg_execution_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub total_api_time: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub avg_api_time: Duration,
}

impl RunSummary {
    pub fn from_results(results: &[JudgedResult], total_time: Duration) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.overall_success).count();

        let judge_counts = results.iter().fold(BTreeMap::new(), |mut count, r| {
            *count.entry(r.judge).or_default() += 1;
            count
        });

        let total_execution_time: Duration = results.iter().map(|r| r.execution_time).sum();
        let total_api_time: Duration = results.iter().map(|r| r.api_execution_time).sum();
        let avg = |d: Duration| match u32::try_from(total) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => d / n,
        };

        Self {
            total,
            passed,
            failed: total - passed,
            judge_counts,
            total_time,
            total_execution_time,
            avg_execution_time: avg(total_execution_time),
            total_api_time,
            avg_api_time: avg(total_api_time),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}
