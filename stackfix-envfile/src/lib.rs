//! Environment layer ingestion.
//!
//! A project configuration directory may carry a `.env` file (variables for every service) and
//! any number of `.env.<service>` files (variables for one service). This crate reads those
//! layers into ordered mappings and classifies them by file name. It does not decide what to do
//! with the variables; that's the `stackfix-compose` crate.

mod discover;
mod layer;
mod ports;

pub use discover::discover_env_files;
pub use layer::{EnvLayer, LayerError, LayerScope, read_layer};
pub use ports::{FsLayerSource, LayerSource};
