pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use colored::Colorize;
use error::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rjudge_client::{lang, PistonClient, Runtime};
use serde::Serialize;

use crate::config::Config;
use crate::probe;
use crate::style;
use crate::testing::{
    AsyncTestcase, DiscoveryWarning, FsTestcase, JudgedResult, Orchestrator, RunReport, RunSummary,
    Submission,
};

#[derive(Debug, Clone)]
pub struct TestOptions {
    pub source_file: PathBuf,
    pub language: Option<String>,
    pub testcase_dir: PathBuf,
    pub json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    started_at: String,
    service: String,
    language: &'a str,
    warnings: Vec<String>,
    summary: RunSummary,
    results: &'a [JudgedResult],
}

/// Language tag for `source_file`: explicit choice, then `[[language]]` globs, then extension.
pub fn determine_language(
    source_file: impl AsRef<Path>,
    explicit: Option<&str>,
    cfg: &Config,
) -> Result<String> {
    if let Some(lang) = explicit {
        return Ok(lang.to_owned());
    }
    let source_file = source_file.as_ref();
    let filename = source_file
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    if let Some(lang) = cfg.find_language_for_filename(&filename) {
        return Ok(lang.to_owned());
    }
    source_file
        .extension()
        .and_then(|ext| lang::language_from_extension(&ext.to_string_lossy()))
        .map(str::to_owned)
        .with_context(|| {
            format!(
                "Cannot determine the language of '{}' (use --lang or add a [[language]] entry)",
                filename
            )
        })
}

pub async fn do_test(opts: &TestOptions, cfg: &Config) -> Result<RunReport> {
    let source = tokio::fs::read_to_string(&opts.source_file)
        .await
        .with_context(|| format!("Cannot read source file {:?}", opts.source_file))?;
    let language = determine_language(&opts.source_file, opts.language.as_deref(), cfg)?;

    let discovery = FsTestcase::enumerate(&opts.testcase_dir).context("Failed to find testcase")?;
    if discovery.testcases.is_empty() {
        bail!(
            "No testcase files found in {}/\nExpected files: input1.txt, output1.txt, input2.txt, output2.txt, etc.",
            opts.testcase_dir.to_string_lossy()
        );
    }
    let warnings = discovery.warnings;
    let testcases = discovery.testcases;

    let started_at = Local::now();
    let plan = probe::select_service(&cfg.service, cfg.rate_limits()).await?;
    log::info!(
        "Running {} test case(s) ({}) with {}",
        testcases.len(),
        language,
        plan.describe()
    );

    let executor = PistonClient::new(plan.base_url.clone(), cfg.service.request_timeout())
        .context("Failed to build HTTP client")?;

    let mut orchestrator = Orchestrator::new(
        Submission::new(language.clone(), source),
        Arc::new(executor),
        plan.limits,
    )
    .retry_policy(cfg.retry_policy());

    let bars = if opts.json {
        Vec::new()
    } else {
        self::spinners(&testcases.iter().map(|t| t.name()).collect::<Vec<_>>())
    };
    if !bars.is_empty() {
        let bars = bars.clone();
        orchestrator = orchestrator.on_progress(move |res| {
            if let Some(bar) = res.index.checked_sub(1).and_then(|i| bars.get(i)) {
                bar.finish_with_message(
                    format!(
                        "Testcase {} ... {}{} [{}ms]",
                        res.name,
                        style::judge_icon(res.judge),
                        " ".repeat(3 - res.judge.to_string().len()),
                        res.execution_time.as_millis(),
                    )
                    .cyan()
                    .to_string(),
                );
            }
        });
    }

    let report = orchestrator.run_all(testcases).await;
    let summary = report.summary();

    if opts.json {
        let json = JsonReport {
            started_at: started_at.to_rfc3339(),
            service: plan.describe(),
            language: &language,
            warnings: warnings.iter().map(DiscoveryWarning::to_string).collect(),
            summary,
            results: &report.results,
        };
        serde_json::to_writer_pretty(io::stdout(), &json)?;
        println!();
        return Ok(report);
    }

    self::print_report(&report, &summary, &warnings);
    Ok(report)
}

fn spinners(names: &[&str]) -> Vec<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let container = MultiProgress::new();
    names
        .iter()
        .map(|name| {
            let bar = container
                .add(ProgressBar::new_spinner())
                .with_style(style.clone())
                .with_message(format!("Testcase {} ...", name));
            bar.enable_steady_tick(Duration::from_millis(50));
            bar
        })
        .collect()
}

fn print_report(
    report: &RunReport,
    summary: &RunSummary,
    warnings: &[DiscoveryWarning],
) {
    println!();
    for w in warnings {
        println!("{} {}", "Warning:".bright_yellow().bold(), w);
    }

    report
        .results
        .iter()
        .filter(|r| !r.overall_success)
        .for_each(style::print_test_result_detail);

    println!();
    style::print_test_result_summary(summary);
    style::print_timing_statistics(summary, &report.results);
    style::print_failed_cases(&report.results);
}

pub async fn list_runtimes(cfg: &Config, json: bool) -> Result<Vec<Runtime>> {
    let plan = probe::select_service(&cfg.service, cfg.rate_limits()).await?;
    let client = PistonClient::new(plan.base_url.clone(), cfg.service.request_timeout())
        .context("Failed to build HTTP client")?;
    let mut runtimes = client
        .runtimes(cfg.service.request_timeout())
        .await
        .with_context(|| format!("Failed to fetch runtimes from {}", client.runtimes_url()))?;
    runtimes.sort_by(|a, b| (&a.language, &a.version).cmp(&(&b.language, &b.version)));

    if json {
        serde_json::to_writer_pretty(io::stdout(), &runtimes)?;
        println!();
        return Ok(runtimes);
    }

    for rt in &runtimes {
        if rt.aliases.is_empty() {
            println!("{} {}", rt.language.bold(), rt.version);
        } else {
            println!(
                "{} {} {}",
                rt.language.bold(),
                rt.version,
                format!("({})", rt.aliases.join(", ")).dimmed()
            );
        }
    }
    Ok(runtimes)
}
