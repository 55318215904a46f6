// ABOUTME: CLI command definitions using clap
// ABOUTME: Defines the keyprobe subcommands and their flags

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use keyprobe_api::KeyRecord;
use keyprobe_ssh::KeyAlgorithm;
use std::path::PathBuf;

pub mod acceptance;
pub mod check;
pub mod fragments;
pub mod generate;
pub mod lookup;

#[derive(Parser)]
#[command(
    name = "keyprobe",
    version,
    about = "Generate SSH keys and verify that name lookups return them intact"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ~/.config/keyprobe/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory API base URL (e.g., https://api.digitalocean.com)
    #[arg(long, global = true, env = "DIGITALOCEAN_API_URL")]
    pub api_url: Option<String>,

    /// API bearer token
    #[arg(long, global = true, env = "DIGITALOCEAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a key pair and print its authorized-key line
    Generate {
        /// Key algorithm (default from config, otherwise rsa)
        #[arg(long, value_enum)]
        algorithm: Option<AlgorithmArg>,

        /// RSA modulus size in bits
        #[arg(long)]
        bits: Option<usize>,

        /// Write the private key here and the public key next to it as .pub
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the create and lookup configuration fragments
    Fragments {
        /// Key name
        #[arg(long)]
        name: String,

        /// Public key in authorized-key format
        #[arg(long)]
        public_key: String,
    },

    /// Verify a state entry against the directory
    Check {
        /// JSON state file
        #[arg(long)]
        state: PathBuf,

        /// Entry address (e.g., data.digitalocean_ssh_key.foobar)
        #[arg(long)]
        address: String,
    },

    /// Show directory records with the given name
    Lookup {
        /// Key name
        name: String,
    },

    /// Run the create-then-lookup scenario against the live directory
    Acceptance {
        /// Leave the created key in place
        #[arg(long)]
        keep: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    Rsa,
    Ed25519,
}

impl From<AlgorithmArg> for KeyAlgorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Rsa => KeyAlgorithm::Rsa,
            AlgorithmArg::Ed25519 => KeyAlgorithm::Ed25519,
        }
    }
}

impl Command {
    /// Commands whose stdout is meant for other tools log quietly.
    pub fn is_machine_readable(&self) -> bool {
        matches!(self, Command::Generate { .. } | Command::Fragments { .. })
    }
}

pub(crate) fn print_record(record: &KeyRecord) {
    println!("  {}:          {}", "ID".dimmed(), record.id);
    println!("  {}:        {}", "Name".dimmed(), record.name);
    println!("  {}: {}", "Fingerprint".dimmed(), record.fingerprint);
    println!("  {}:  {}", "Public Key".dimmed(), record.public_key);
}
