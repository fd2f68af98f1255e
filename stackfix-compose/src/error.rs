//! Error types for stackfix-compose.
//!
//! This module separates:
//! - Malformed input (exit code 2): the document does not parse, or a node has the wrong shape
//! - Runtime errors (exit code 1): unreadable environment layers, serialization failures

use camino::Utf8PathBuf;
use stackfix_envfile::LayerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixupError {
    /// The raw document is not valid YAML.
    #[error("malformed compose document: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// A node exists but has the wrong shape for its position.
    #[error("malformed compose document: `{path}` must be {expected}, found {found}")]
    Shape {
        /// Dotted location of the node, e.g. `services.web.ports`.
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// An environment layer exists but could not be read or parsed.
    #[error("unable to read {path}")]
    EnvFileRead {
        path: Utf8PathBuf,
        #[source]
        source: LayerError,
    },

    /// The corrected document could not be serialized.
    #[error("unable to serialize compose document")]
    Serialization(#[source] serde_yaml::Error),
}

impl FixupError {
    pub(crate) fn shape(path: &str, expected: &'static str, found: &crate::Node) -> Self {
        FixupError::Shape {
            path: path.to_string(),
            expected,
            found: found.kind(),
        }
    }

    /// True when the problem is with the input document itself.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, FixupError::Parse(_) | FixupError::Shape { .. })
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_malformed_input() { 2 } else { 1 }
    }
}

pub type FixupResult<T> = Result<T, FixupError>;
