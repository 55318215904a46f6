// ABOUTME: Entry point for the keyprobe CLI
// ABOUTME: Loads .env, sets up logging, and runs the chosen subcommand

use anyhow::Result;
use clap::Parser;
use keyprobe_cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if cli.command.is_machine_readable() {
        keyprobe_log::init_quiet();
    } else {
        keyprobe_log::init();
    }

    keyprobe_cli::run_command(cli).await
}
