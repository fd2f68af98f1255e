//! Port traits abstracting all I/O away from the pipeline.

use camino::{Utf8Path, Utf8PathBuf};

/// Source of the canonical (merged, interpolated) compose document.
pub trait ComposeSource {
    fn canonical_config(
        &self,
        compose_files: &[Utf8PathBuf],
        env_files: &[Utf8PathBuf],
    ) -> anyhow::Result<String>;
}

/// File-system operations on generated artifacts.
pub trait WritePort {
    /// Current contents of `path`, or `None` when it does not exist.
    fn read_existing(&self, path: &Utf8Path) -> anyhow::Result<Option<String>>;
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
