// ABOUTME: Implementation of 'keyprobe acceptance' command
// ABOUTME: Runs the create-then-lookup scenario against the configured directory

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use keyprobe_api::KeyDirectory;
use keyprobe_core::{run_lookup_scenario, LocalEngine, ScenarioOptions, ScenarioReport};

pub async fn scenario<D>(directory: Arc<D>, options: &ScenarioOptions) -> Result<ScenarioReport>
where
    D: KeyDirectory + 'static,
{
    let mut engine = LocalEngine::new(directory.clone());
    run_lookup_scenario(&mut engine, directory.as_ref(), options)
        .await
        .context("lookup scenario failed")
}

pub async fn run<D>(directory: Arc<D>, options: &ScenarioOptions) -> Result<()>
where
    D: KeyDirectory + 'static,
{
    let report = scenario(directory, options).await?;

    println!("{} {}", "✓".green(), "lookup scenario passed".bold());
    println!("  {}:       {}", "Name".dimmed(), report.name);
    println!("  {}:         {}", "ID".dimmed(), report.record.id);
    println!("  {}: {}", "Fingerprint".dimmed(), report.record.fingerprint);
    if report.destroyed {
        println!("  {}:     {}", "Status".dimmed(), "destroyed".dimmed());
    } else {
        println!("  {}:     {}", "Status".dimmed(), "kept".yellow());
    }
    Ok(())
}
