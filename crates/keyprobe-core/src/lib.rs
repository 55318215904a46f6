// ABOUTME: Core of keyprobe: config, fragments, state, apply engine, and verification
// ABOUTME: Wires key generation and the directory client into the lookup scenario

//! # keyprobe-core
//!
//! Checks that looking an SSH key up by name returns exactly the key that
//! was created.
//!
//! - [`fragment`]: render and parse `digitalocean_ssh_key` resource and data blocks
//! - [`engine`]: [`ApplyEngine`] seam and the directory-backed [`LocalEngine`]
//! - [`verify`]: existence and attribute checks over a [`State`]
//! - [`scenario`]: the two-step create-then-lookup run
//! - [`config`]: [`ProbeConfig`] loading and the typed directory accessor

pub mod config;
pub mod engine;
pub mod error;
pub mod fragment;
pub mod scenario;
pub mod state;
pub mod verify;

pub use config::ProbeConfig;
pub use engine::{ApplyEngine, LocalEngine};
pub use error::{ConfigError, EngineError, FragmentError, ScenarioError, VerifyError};
pub use fragment::{Expr, LookupFragment, ResourceFragment, KEY_RESOURCE_TYPE};
pub use scenario::{run_lookup_scenario, ScenarioOptions, ScenarioReport};
pub use state::{ResourceState, State};
pub use verify::{check_attribute, check_key_exists};
