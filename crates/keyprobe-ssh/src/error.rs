// ABOUTME: Error types for SSH key operations using thiserror.
// ABOUTME: Provides typed errors for key generation, encoding, and persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during SSH key operations.
#[derive(Error, Debug)]
pub enum SshError {
    /// Failed to read a key file from disk.
    #[error("failed to read SSH key from {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse an SSH private key.
    #[error("failed to parse SSH key from {path}: {source}")]
    ParseKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// Failed to parse authorized-key text.
    #[error("failed to parse public key: {0}")]
    ParsePublicKey(#[source] ssh_key::Error),

    /// Failed to generate an SSH key (entropy or key construction failure).
    #[error("failed to generate SSH key: {0}")]
    GenerateKey(#[source] ssh_key::Error),

    /// Failed to serialize a key.
    #[error("failed to serialize key: {0}")]
    SerializeKey(#[source] ssh_key::Error),

    /// Requested RSA modulus is below the accepted minimum.
    #[error("RSA key size {bits} is too small (minimum is {min} bits)")]
    KeySizeTooSmall { bits: usize, min: usize },

    /// Encoded public key is not valid single-line authorized-key text.
    #[error("invalid authorized key text: {0}")]
    InvalidAuthorizedKey(String),

    /// Failed to write a key file to disk.
    #[error("failed to write key to {path}: {source}")]
    WriteKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set file permissions.
    #[error("failed to set permissions on {path}: {source}")]
    SetPermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;
