// ABOUTME: Implementation of 'keyprobe check' command
// ABOUTME: Runs the existence check for one entry of a JSON state file

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use keyprobe_api::{KeyDirectory, KeyRecord};
use keyprobe_core::{check_key_exists, State};

pub fn read_state(path: &Path) -> Result<State> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read state file {}", path.display()))?;
    State::from_json(&contents)
        .with_context(|| format!("failed to parse state file {}", path.display()))
}

pub async fn check<D>(state: &State, address: &str, directory: &D) -> Result<KeyRecord>
where
    D: KeyDirectory + ?Sized,
{
    let mut record = KeyRecord::default();
    check_key_exists(state, address, directory, &mut record)
        .await
        .with_context(|| format!("check failed for {address}"))?;
    Ok(record)
}

pub async fn run<D>(state_path: &Path, address: &str, directory: &D) -> Result<()>
where
    D: KeyDirectory + ?Sized,
{
    let state = read_state(state_path)?;
    let record = check(&state, address, directory).await?;

    println!("{} {}", "✓".green(), address.bold());
    super::print_record(&record);
    Ok(())
}
