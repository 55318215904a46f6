// ABOUTME: Library exports for the keyprobe CLI
// ABOUTME: Resolves configuration and dispatches subcommands

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use keyprobe_core::ProbeConfig;

pub mod commands;

pub use commands::{Cli, Command};

/// Load configuration with precedence flag > env > file > default.
pub fn resolve_config(
    path: Option<&Path>,
    api_url: Option<String>,
    token: Option<String>,
) -> Result<ProbeConfig> {
    let mut config = ProbeConfig::load(path).context("failed to load configuration")?;
    config.apply_env();
    Ok(config.with_overrides(api_url, token))
}

/// Run a command, loading configuration only for commands that use it
pub async fn run_command(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config,
        api_url,
        token,
    } = cli;
    let load = || -> Result<ProbeConfig> {
        let config = resolve_config(config.as_deref(), api_url.clone(), token.clone())?;
        tracing::debug!(?config, "resolved configuration");
        Ok(config)
    };

    match command {
        Command::Generate {
            algorithm,
            bits,
            out,
        } => {
            let policy = match commands::generate::policy_from_flags(algorithm, bits) {
                Some(policy) => policy,
                None => commands::generate::resolve_policy(load()?.key, algorithm, bits),
            };
            commands::generate::run(&policy, out.as_deref())
        }
        Command::Fragments { name, public_key } => commands::fragments::run(&name, &public_key),
        Command::Check { state, address } => {
            let directory = load()?
                .directory()
                .context("cannot reach key directory")?;
            commands::check::run(&state, &address, &directory).await
        }
        Command::Lookup { name } => {
            let directory = load()?
                .directory()
                .context("cannot reach key directory")?;
            commands::lookup::run(&name, &directory).await
        }
        Command::Acceptance { keep } => {
            let config = load()?;
            let directory = Arc::new(config.directory().context("cannot reach key directory")?);
            let mut options = config.scenario_options();
            options.keep = keep;
            commands::acceptance::run(directory, &options).await
        }
    }
}
