//! Compose fixup engine.
//!
//! Takes the canonical document printed by `docker compose config` and rewrites it so every
//! project stack satisfies the platform invariants:
//! - `networks.ddev_default` is the external shared network, `networks.default` the project's
//!   own (never external) network, and every other owned network carries the platform label.
//! - Every service joins both networks.
//! - `.env` / `.env.<service>` layers are injected into service environments, `$`-escaped.
//! - Long-syntax port bindings get the configured `host_ip`.
//!
//! This crate does not run compose or write files; that's `stackfix-core`.

mod document;
mod error;
mod fixup;
mod node;
mod policy;

pub use document::ComposeDocument;
pub use error::{FixupError, FixupResult};
pub use fixup::{
    PLATFORM_LABEL, PLATFORM_LABEL_VALUE, PROJECT_NETWORK_KEY, SHARED_NETWORK_KEY, escape_dollars,
    fixup, fixup_document, fixup_with,
};
pub use node::{Mapping, Node, Scalar};
pub use policy::{FixupPolicy, SHARED_NETWORK_NAME, compose_project_name, project_network_name};
