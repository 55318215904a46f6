// ABOUTME: SSH key pair generation, authorized-key rendering, and persistence.
// ABOUTME: Produces fresh RSA or ed25519 keys and their single-line public text.

use crate::error::{Result, SshError};
use serde::{Deserialize, Serialize};
use ssh_key::private::{KeypairData, RsaKeypair};
use ssh_key::{Algorithm, LineEnding, PrivateKey, PublicKey};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Smallest RSA modulus the generator accepts.
pub const MIN_RSA_BITS: usize = 2048;

/// RSA modulus used when a policy does not say otherwise.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Key algorithm to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    #[default]
    Rsa,
    Ed25519,
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => write!(f, "rsa"),
            KeyAlgorithm::Ed25519 => write!(f, "ed25519"),
        }
    }
}

/// What kind of key pair to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPolicy {
    pub algorithm: KeyAlgorithm,
    /// Modulus size, only consulted for RSA.
    pub rsa_bits: usize,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            algorithm: KeyAlgorithm::Rsa,
            rsa_bits: DEFAULT_RSA_BITS,
        }
    }
}

impl KeyPolicy {
    pub fn rsa(bits: usize) -> Self {
        Self {
            algorithm: KeyAlgorithm::Rsa,
            rsa_bits: bits,
        }
    }

    pub fn ed25519() -> Self {
        Self {
            algorithm: KeyAlgorithm::Ed25519,
            ..Self::default()
        }
    }

    /// Reject policies the generator will not honour.
    ///
    /// # Errors
    /// Returns `SshError::KeySizeTooSmall` for RSA sizes below [`MIN_RSA_BITS`].
    pub fn validate(&self) -> Result<()> {
        if self.algorithm == KeyAlgorithm::Rsa && self.rsa_bits < MIN_RSA_BITS {
            return Err(SshError::KeySizeTooSmall {
                bits: self.rsa_bits,
                min: MIN_RSA_BITS,
            });
        }
        Ok(())
    }
}

/// Single-line OpenSSH public key text (`<algorithm> <base64>`).
///
/// Never carries leading or trailing whitespace and never contains a line break.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorizedKeyText(String);

impl AuthorizedKeyText {
    /// Validate and canonicalize existing authorized-key text.
    ///
    /// The text is parsed and re-encoded so the result matches what
    /// [`authorized_key_text`] would produce for the same key.
    pub fn parse(text: &str) -> Result<Self> {
        let public_key = PublicKey::from_openssh(text.trim()).map_err(SshError::ParsePublicKey)?;
        authorized_key_text(&public_key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthorizedKeyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AuthorizedKeyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AuthorizedKeyText {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AuthorizedKeyText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Generate a fresh key pair from the system random source.
///
/// # Errors
/// Returns `SshError::KeySizeTooSmall` for a rejected policy and
/// `SshError::GenerateKey` if key generation fails.
pub fn generate_key_pair(policy: &KeyPolicy) -> Result<PrivateKey> {
    policy.validate()?;

    let mut rng = rand::thread_rng();
    let key = match policy.algorithm {
        KeyAlgorithm::Ed25519 => {
            PrivateKey::random(&mut rng, Algorithm::Ed25519).map_err(SshError::GenerateKey)?
        }
        KeyAlgorithm::Rsa => {
            let keypair =
                RsaKeypair::random(&mut rng, policy.rsa_bits).map_err(SshError::GenerateKey)?;
            PrivateKey::new(KeypairData::from(keypair), "").map_err(SshError::GenerateKey)?
        }
    };

    debug!(algorithm = %policy.algorithm, "generated key pair");
    Ok(key)
}

/// Render a public key as trimmed single-line authorized-key text.
///
/// # Errors
/// Returns `SshError::SerializeKey` if OpenSSH encoding fails and
/// `SshError::InvalidAuthorizedKey` if the encoding spans several lines.
pub fn authorized_key_text(public_key: &PublicKey) -> Result<AuthorizedKeyText> {
    let encoded = public_key.to_openssh().map_err(SshError::SerializeKey)?;
    let trimmed = encoded.trim();

    if trimmed.is_empty() {
        return Err(SshError::InvalidAuthorizedKey("empty encoding".to_string()));
    }
    if trimmed.contains(['\n', '\r']) {
        return Err(SshError::InvalidAuthorizedKey(
            "encoding contains a line break".to_string(),
        ));
    }

    Ok(AuthorizedKeyText(trimmed.to_string()))
}

/// Generate a key pair and render its public half in one step.
pub fn generate_authorized_key(policy: &KeyPolicy) -> Result<(PrivateKey, AuthorizedKeyText)> {
    let private_key = generate_key_pair(policy)?;
    let text = authorized_key_text(private_key.public_key())?;
    Ok((private_key, text))
}

/// Load an existing SSH private key from disk.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_key(key_path: &Path) -> Result<PrivateKey> {
    let key_data = std::fs::read_to_string(key_path).map_err(|e| SshError::ReadKey {
        path: key_path.to_path_buf(),
        source: e,
    })?;

    PrivateKey::from_openssh(&key_data).map_err(|e| SshError::ParseKey {
        path: key_path.to_path_buf(),
        source: e,
    })
}

/// Write a key pair to disk in OpenSSH format.
///
/// Creates the parent directory if needed. Sets Unix permissions to 0600
/// on the private key. Also writes the public key with `.pub` extension.
///
/// # Errors
/// Returns an error if directory creation, serialization, or file writing fails.
pub fn save_key_pair(key_path: &Path, private_key: &PrivateKey) -> Result<()> {
    if let Some(parent) = key_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SshError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let private_key_str = private_key
        .to_openssh(LineEnding::LF)
        .map_err(SshError::SerializeKey)?;

    std::fs::write(key_path, private_key_str.as_bytes()).map_err(|e| SshError::WriteKey {
        path: key_path.to_path_buf(),
        source: e,
    })?;

    // 0600 = rw-------
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(key_path, std::fs::Permissions::from_mode(0o600)).map_err(
            |e| SshError::SetPermissions {
                path: key_path.to_path_buf(),
                source: e,
            },
        )?;
    }

    let pub_key_path = key_path.with_extension("pub");
    let public_text = authorized_key_text(private_key.public_key())?;

    std::fs::write(&pub_key_path, format!("{public_text}\n")).map_err(|e| {
        SshError::WriteKey {
            path: pub_key_path.clone(),
            source: e,
        }
    })?;

    info!(
        private = %key_path.display(),
        public = %pub_key_path.display(),
        "wrote key pair"
    );

    Ok(())
}
