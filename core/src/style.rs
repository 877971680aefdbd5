use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;

use crate::testing::{JudgeCode, JudgedResult, RunSummary};

pub fn is_truecolor_supported() -> bool {
    let Ok(v) = std::env::var("COLORTERM") else {
        return false
    };
    matches!(v.as_str(), "truecolor" | "24bit")
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for JudgeCode {
    fn color(&self) -> Color {
        use JudgeCode::*;
        if !self::is_truecolor_supported() {
            return match self {
                AC => Color::Green,
                WA => Color::Yellow,
                RE => Color::Magenta,
                CE => Color::Red,
            };
        }

        match self {
            AC => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            WA => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            RE => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
            CE => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
        }
    }
}

pub fn judge_icon(judge: JudgeCode) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", judge)
        .on_color(judge.color())
        .bold()
        .color(fg)
}

fn secs(d: std::time::Duration) -> String {
    format!("{:.3}s", d.as_secs_f64())
}

pub fn print_test_result_summary(summary: &RunSummary) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    if summary.all_passed() {
        let msg = format!("All {} tests passed ✨", summary.total);
        print!("{}", msg.green());
    } else {
        let summary_msg = if summary.passed > 0 {
            format!("{}/{} tests failed 💣", summary.failed, summary.total)
        } else {
            format!("All {} tests failed 💀", summary.total)
        };

        let detail_msg = summary
            .judge_counts
            .iter()
            .filter(|(&judge, _)| judge != JudgeCode::AC)
            .map(|(&judge, &cnt)| {
                format!(
                    "{}{}{}",
                    self::judge_icon(judge),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}

pub fn print_timing_statistics(summary: &RunSummary, results: &[JudgedResult]) {
    println!("\n{}", "Timing Statistics:".cyan().bold());
    println!("  Total execution time:      {}", secs(summary.total_time));
    println!("  Average per test case:     {}", secs(summary.avg_execution_time));
    println!("  Total API time:            {}", secs(summary.total_api_time));
    println!("  Average API time per test: {}", secs(summary.avg_api_time));

    println!("\n{}", "Individual Test Case Times:".cyan().bold());
    for r in results {
        let mark = if r.overall_success {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {}: {} (API: {})",
            mark,
            r.name,
            secs(r.execution_time),
            secs(r.api_execution_time)
        );
    }
}

pub fn print_failed_cases(results: &[JudgedResult]) {
    let failed: Vec<_> = results.iter().filter(|r| !r.overall_success).collect();
    if failed.is_empty() {
        return;
    }
    println!("\n{}", "Failed test cases:".bright_red().bold());
    for r in failed {
        println!("  - {}: {}", r.name, r.judge.reason());
    }
}

pub fn print_test_result_detail(res: &JudgedResult) {
    let stdout_lines: Vec<_> = res.outcome.stdout.lines().collect();
    let truth_lines: Vec<_> = res.expected_output.lines().collect();

    let (cols, _) = terminal::size().unwrap_or((40, 40));
    let cols = (cols as usize).max(24);

    const BOLD_LINE: &str = "━";
    const THIN_LINE: &str = "─";

    let bold_bar = BOLD_LINE.repeat(cols).blue().bold();

    let title_color = Color::BrightYellow;
    println!(
        "\n{}: {} [{}ms (API: {}ms)]\n{}",
        res.name.color(title_color).bold(),
        self::judge_icon(res.judge),
        res.execution_time.as_millis(),
        res.api_execution_time.as_millis(),
        bold_bar,
    );

    fn print_sub_title(s: &str, cols: usize) {
        println!(
            "{}{}",
            s.cyan().bold(),
            THIN_LINE
                .repeat(cols.saturating_sub(s.len() + 1))
                .bright_black(),
        )
    }

    fn print_lines(lines: &[&str], entire_str: &str) {
        if lines.is_empty() {
            println!("{}", "<EMPTY>".magenta().dimmed());
            return;
        }
        for (i, line) in lines.iter().enumerate() {
            let trimmed = line.trim_end();
            print!("{}", trimmed);

            let num_trailling_whitespace = line.len() - trimmed.len();
            if num_trailling_whitespace > 0 {
                print!(
                    "{}{}",
                    " ".repeat(num_trailling_whitespace).on_red(),
                    "(Trailling whitespace)".bright_red().bold()
                );
            }

            let is_last_line = i + 1 == lines.len();
            if is_last_line && !entire_str.ends_with('\n') {
                print!("{}", " Missing new line ".on_yellow().black().bold());
            }

            println!();
        }
    }

    print_sub_title("[input]", cols);
    let input_lines: Vec<_> = res.input.lines().collect();
    print_lines(&input_lines, &res.input);

    print_sub_title("[expected]", cols);
    print_lines(&truth_lines, &res.expected_output);

    print_sub_title("[stdout]", cols);
    print_lines(&stdout_lines, &res.outcome.stdout);

    if !res.outcome.stderr.is_empty() {
        print_sub_title("[stderr]", cols);
        println!("{}", res.outcome.stderr.trim_end());
    }

    if let Some(msg) = &res.outcome.compile_error {
        print_sub_title("[compile error]", cols);
        println!("{}", msg.trim_end().bright_red());
    }

    if let Some(msg) = &res.outcome.runtime_error {
        print_sub_title("[runtime error]", cols);
        println!("{}", msg.trim_end().bright_red());
    }

    println!("{}", bold_bar);
}
