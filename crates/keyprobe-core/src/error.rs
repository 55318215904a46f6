// ABOUTME: Error types for keyprobe-core
// ABOUTME: Config, fragment parsing, apply engine, verification, and scenario failures

use keyprobe_api::{ApiError, KeyId};
use keyprobe_ssh::SshError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no API token configured (set DIGITALOCEAN_TOKEN or api.token)")]
    MissingToken,

    #[error("failed to build directory client: {0}")]
    Client(#[from] ApiError),
}

/// Syntax errors in a configuration fragment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    #[error("line {line}, column {column}: unexpected character {found:?}")]
    UnexpectedChar {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("line {line}, column {column}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        column: usize,
        expected: &'static str,
        found: String,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: invalid escape sequence \\{found}")]
    InvalidEscape { line: usize, found: char },

    #[error("line {line}: template interpolation is not supported")]
    Interpolation { line: usize },

    #[error("duplicate attribute {attribute:?} in block {block}")]
    DuplicateAttribute { block: String, attribute: String },
}

/// Failures while applying configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Fragment(#[from] FragmentError),

    #[error("directory call failed: {0}")]
    Api(#[from] ApiError),

    #[error("unsupported block type {0:?}")]
    UnsupportedBlock(String),

    #[error("unsupported resource type {0:?}")]
    UnsupportedType(String),

    #[error("malformed {kind} block: {reason}")]
    MalformedBlock { kind: String, reason: String },

    #[error("{0} is declared more than once")]
    DuplicateAddress(String),

    #[error("{address}: missing required attribute {attribute:?}")]
    MissingAttribute { address: String, attribute: String },

    #[error("{address}: unknown attribute {attribute:?}")]
    UnknownAttribute { address: String, attribute: String },

    #[error("{address}: cannot resolve reference {reference}")]
    UnresolvedReference { address: String, reference: String },

    #[error("{address}: stored id {id:?} is not a key id")]
    CorruptState { address: String, id: String },

    #[error("no ssh key found with name {0:?}")]
    KeyNameNotFound(String),

    #[error("{count} ssh keys found with name {name:?}")]
    AmbiguousKeyName { name: String, count: usize },
}

/// Failures of the existence and attribute checks.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No ssh key ID is set for {0}")]
    MissingIdentifier(String),

    #[error("{address}: id {id:?} is not numeric: {source}")]
    ParseFailure {
        address: String,
        id: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("directory lookup failed: {0}")]
    ExternalCall(#[source] ApiError),

    #[error("Key not found: requested {expected}, directory returned {actual}")]
    RecordMismatch { expected: KeyId, actual: KeyId },

    #[error("{address}: attribute {attribute:?} is not set")]
    MissingAttribute { address: String, attribute: String },

    #[error("{address}: attribute {attribute:?} expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        address: String,
        attribute: String,
        expected: String,
        actual: String,
    },
}

/// Failures of an end-to-end lookup scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("unable to generate public key: {0}")]
    Key(#[from] SshError),

    #[error("step {step} failed: {source}")]
    Step {
        step: usize,
        #[source]
        source: EngineError,
    },

    #[error("check failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("destroy failed: {0}")]
    Destroy(#[source] EngineError),

    #[error("ssh key {0} still exists after destroy")]
    StillExists(KeyId),

    #[error("destroy check failed: {0}")]
    Api(#[source] ApiError),
}
