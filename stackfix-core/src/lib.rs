//! Embeddable render pipeline for stackfix.
//!
//! Provides a clap-free, I/O-abstracted entry point that turns a project's compose files into
//! the corrected full compose artifact.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`ComposeSource`](ports::ComposeSource) produces the canonical compose document
//! - [`WritePort`](ports::WritePort) reads and writes the generated artifact
//!
//! The [`adapters`] module provides the `docker compose` and filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_render`](pipeline::run_render) runs discovery, canonicalization, fixup and write

pub mod adapters;
pub mod bind;
pub mod discover;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use bind::{docker_ip, resolve_bind_ip};
pub use discover::discover_compose_files;
pub use pipeline::{RenderOutcome, render_patch, run_render};
pub use settings::{BindSettings, RenderSettings};

// Re-export the engine so embedders don't need stackfix-compose directly.
pub use stackfix_compose::{ComposeDocument, FixupError, FixupPolicy};
pub use stackfix_envfile::discover_env_files;

/// Project configuration directory, relative to the project root.
pub const CONF_DIR: &str = ".ddev";
/// Generated base compose file, always first when present.
pub const BASE_COMPOSE_FILE: &str = ".ddev-docker-compose-base.yaml";
/// User override file, always last when present.
pub const OVERRIDE_COMPOSE_FILE: &str = "docker-compose.override.yaml";
/// The corrected document written by the pipeline.
pub const FULL_COMPOSE_FILE: &str = ".ddev-docker-compose-full.yaml";
