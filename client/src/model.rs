use serde::{Deserialize, Deserializer, Serialize};

use crate::lang;

/// One submission to the execution service. Retries resend the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub language: String,
    pub source: String,
    pub stdin: String,
}

impl ExecutionRequest {
    pub fn new(
        language: impl Into<String>,
        source: impl Into<String>,
        stdin: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
            stdin: stdin.into(),
        }
    }

    pub fn to_body(&self) -> ExecuteBody<'_> {
        ExecuteBody {
            language: &self.language,
            version: ExecuteBody::ANY_VERSION,
            files: vec![SourceFile {
                name: lang::filename_for(&self.language),
                content: &self.source,
            }],
            stdin: &self.stdin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecuteBody<'a> {
    pub language: &'a str,
    pub version: &'a str,
    pub files: Vec<SourceFile<'a>>,
    pub stdin: &'a str,
}

impl ExecuteBody<'_> {
    pub const ANY_VERSION: &'static str = "*";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile<'a> {
    pub name: &'a str,
    pub content: &'a str,
}

//---------------------------------------------------------
// Response of `POST execute`

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PistonResponse {
    #[serde(default)]
    pub run: Option<StageOutput>,
    #[serde(default)]
    pub compile: Option<StageOutput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StageOutput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stdout: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub stderr: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub signal: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

//---------------------------------------------------------
// Response of `GET runtimes`

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub language: String,
    pub version: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

//---------------------------------------------------------

/// Classified result of one completed execution attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub compile_error: Option<String>,
    pub runtime_error: Option<String>,
    /// The service reported exit code 0 and no compile failure.
    pub success: bool,
}

impl ExecutionOutcome {
    pub const NO_RUN_OUTPUT: &'static str = "No execution output received";
    pub const COMPILATION_FAILED: &'static str = "Compilation failed";

    /// Terminal failure carrying only a runtime-error message.
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            runtime_error: Some(msg.into()),
            ..Default::default()
        }
    }

    pub fn from_response(resp: PistonResponse) -> Self {
        let mut out = Self::default();

        match resp.run {
            Some(run) => {
                let code = run.code.unwrap_or(-1);
                out.success = code == 0;
                if code != 0 && run.stderr.is_empty() {
                    let mut msg = format!("Process exited with code {}", code);
                    if let Some(sig) = run.signal {
                        msg.push_str(&format!(" (signal {})", sig));
                    }
                    out.runtime_error = Some(msg);
                }
                out.stdout = run.stdout;
                out.stderr = run.stderr;
            }
            None => {
                out.runtime_error = Some(Self::NO_RUN_OUTPUT.to_owned());
                out.success = false;
            }
        }

        // A failed build overrides whatever the run stage reported.
        if let Some(compile) = resp.compile {
            if !compile.stderr.is_empty() {
                out.compile_error = Some(compile.stderr);
                out.success = false;
            } else if compile.code.unwrap_or(0) != 0 {
                out.compile_error = Some(if compile.stdout.is_empty() {
                    Self::COMPILATION_FAILED.to_owned()
                } else {
                    compile.stdout
                });
                out.success = false;
            }
        }

        out
    }
}
