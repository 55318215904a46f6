// ABOUTME: SSH key material utilities for keyprobe.
// ABOUTME: Generates key pairs and renders them as single-line authorized-key text.

//! # keyprobe-ssh
//!
//! Key material generation for keyprobe lookups.
//!
//! ## Features
//!
//! - **Generation**: fresh RSA (2048 bits and up) or ed25519 key pairs from the system RNG
//! - **Authorized keys**: trimmed single-line OpenSSH public key text
//! - **Fingerprinting**: hex SHA256 of the wire encoding and OpenSSH `SHA256:` form
//!
//! ## Example
//!
//! ```no_run
//! use keyprobe_ssh::{generate_authorized_key, KeyPolicy};
//!
//! let (_private_key, public_text) =
//!     generate_authorized_key(&KeyPolicy::default()).expect("key should generate");
//! println!("{}", public_text);
//! ```

mod error;
mod fingerprint;
mod key;

pub use error::{Result, SshError};
pub use fingerprint::{compute_fingerprint, sha256_fingerprint};
pub use key::{
    authorized_key_text, generate_authorized_key, generate_key_pair, load_key, save_key_pair,
    AuthorizedKeyText, KeyAlgorithm, KeyPolicy, DEFAULT_RSA_BITS, MIN_RSA_BITS,
};

// Re-export ssh_key types for convenience
pub use ssh_key::{PrivateKey, PublicKey};
