// ABOUTME: Implementation of 'keyprobe fragments' command
// ABOUTME: Prints the create and lookup configurations for a key

use anyhow::{Context, Result};
use colored::Colorize;

use keyprobe_core::scenario::scenario_configs;
use keyprobe_ssh::AuthorizedKeyText;

pub fn render(name: &str, public_key: &str) -> Result<(String, String)> {
    let public_key = AuthorizedKeyText::parse(public_key).context("invalid public key")?;
    Ok(scenario_configs(name, &public_key))
}

pub fn run(name: &str, public_key: &str) -> Result<()> {
    let (create, read) = render(name, public_key)?;

    println!("{}", "# step 1: create".dimmed());
    print!("{create}");
    println!();
    println!("{}", "# step 2: create and look up by name".dimmed());
    print!("{read}");
    Ok(())
}
