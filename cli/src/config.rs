use anyhow::Context as _;
use rjudge_core::config::{Config, EnvOverrides};

use crate::{cmd::GlobalArgs, util};

/// Config file (or defaults), then environment, then command-line flags.
pub fn load(args: &GlobalArgs) -> anyhow::Result<Config> {
    let cfg = match &args.config {
        Some(path) => Config::from_toml_file(path.clone())?,
        None => Config::from_file_finding_in_ancestors(util::current_dir())?,
    };
    let env = EnvOverrides::from_env()?;
    let cfg = cfg.with_env(env)?;
    with_args(cfg, args)
}

pub fn with_args(mut cfg: Config, args: &GlobalArgs) -> anyhow::Result<Config> {
    let GlobalArgs {
        subcmd: _,
        config: _,
        base_url,
        no_probe,
    } = args;

    if let Some(url) = base_url {
        cfg.service.base_url = url.clone();
    }
    if *no_probe {
        cfg.service.probe = false;
    }
    cfg.validate().context("Invalid settings")?;
    Ok(cfg)
}
