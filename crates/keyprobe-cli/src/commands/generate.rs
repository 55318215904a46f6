// ABOUTME: Implementation of 'keyprobe generate' command
// ABOUTME: Creates a key pair and prints its authorized-key line

use anyhow::{Context, Result};
use std::path::Path;

use keyprobe_ssh::{generate_authorized_key, save_key_pair, sha256_fingerprint, KeyPolicy};

use super::AlgorithmArg;

/// Merge the flag overrides into the configured policy.
pub fn resolve_policy(
    configured: KeyPolicy,
    algorithm: Option<AlgorithmArg>,
    bits: Option<usize>,
) -> KeyPolicy {
    let mut policy = configured;
    if let Some(algorithm) = algorithm {
        policy.algorithm = algorithm.into();
    }
    if let Some(bits) = bits {
        policy.rsa_bits = bits;
    }
    policy
}

/// The policy when the flags pin it down without consulting config.
pub fn policy_from_flags(algorithm: Option<AlgorithmArg>, bits: Option<usize>) -> Option<KeyPolicy> {
    match (algorithm?, bits) {
        (AlgorithmArg::Ed25519, _) => Some(KeyPolicy::ed25519()),
        (AlgorithmArg::Rsa, Some(bits)) => Some(KeyPolicy::rsa(bits)),
        (AlgorithmArg::Rsa, None) => None,
    }
}

pub fn run(policy: &KeyPolicy, out: Option<&Path>) -> Result<()> {
    let (private_key, public_key) =
        generate_authorized_key(policy).context("failed to generate key pair")?;

    if let Some(path) = out {
        save_key_pair(path, &private_key)
            .with_context(|| format!("failed to write key pair to {}", path.display()))?;
        eprintln!(
            "wrote {} ({})",
            path.display(),
            sha256_fingerprint(private_key.public_key())
        );
    }

    println!("{public_key}");
    Ok(())
}
