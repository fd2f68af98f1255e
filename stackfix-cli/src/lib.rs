//! Library half of the `stackfix` binary: project configuration and environment inspection,
//! exposed so they can be tested without spawning the CLI.

pub mod config;
pub mod env;
