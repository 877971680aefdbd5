use std::process::ExitCode;

use rjudge_core::action;

use super::{GlobalArgs, SubcmdResult};
use crate::config;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(short, long)]
    pub json: bool,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load(global_args)?;
    action::list_runtimes(&cfg, args.json).await?;
    Ok(ExitCode::SUCCESS)
}
