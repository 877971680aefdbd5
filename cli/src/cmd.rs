pub mod init;
pub mod langs;

use std::path::PathBuf;
use std::process::ExitCode;

use rjudge_client::Url;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Config file to use instead of searching for rjudge.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the Piston API
    #[arg(long, global = true)]
    pub base_url: Option<Url>,

    /// Skip the runtime check and use the configured service as is
    #[arg(long, global = true)]
    pub no_probe: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),
    Langs(langs::Args),

    #[command(alias("t"))]
    Test(test::Args),
}

pub type SubcmdResult = anyhow::Result<ExitCode>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Langs(args) => langs::exec(args, self).await,
            Test(args) => test::exec(args, self).await,
        }
    }
}
