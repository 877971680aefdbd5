use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{ensure, Context as _};
use colored::Colorize;
use rjudge_core::Config;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let path = args.dir.join(Config::FILENAME);
    ensure!(!path.exists(), "{} already exists", path.to_string_lossy());

    std::fs::write(&path, Config::example_toml())
        .with_context(|| format!("Cannot write {}", path.to_string_lossy()))?;
    println!(
        "{}",
        format!("Successfully wrote {}", path.to_string_lossy()).green()
    );
    Ok(ExitCode::SUCCESS)
}
