//! Default port implementations.

use crate::ports::{ComposeSource, WritePort};
use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::io;
use std::process::Command;
use tracing::debug;

/// Canonicalizes compose files by running `<program> compose ... config`.
#[derive(Debug, Clone)]
pub struct DockerComposeSource {
    pub program: String,
    /// Working directory for the compose invocation.
    pub working_dir: Utf8PathBuf,
}

impl DockerComposeSource {
    pub fn new(program: impl Into<String>, working_dir: Utf8PathBuf) -> Self {
        Self {
            program: program.into(),
            working_dir,
        }
    }

    /// Arguments passed to the program, excluding the program itself.
    pub fn args(compose_files: &[Utf8PathBuf], env_files: &[Utf8PathBuf]) -> Vec<String> {
        let mut args = vec!["compose".to_string()];
        for file in compose_files {
            args.push("-f".to_string());
            args.push(file.to_string());
        }
        // Every profile, so optional services are fixed up too.
        args.push("--profile".to_string());
        args.push("*".to_string());
        for file in env_files {
            args.push("--env-file".to_string());
            args.push(file.to_string());
        }
        args.push("config".to_string());
        args
    }
}

impl ComposeSource for DockerComposeSource {
    fn canonical_config(
        &self,
        compose_files: &[Utf8PathBuf],
        env_files: &[Utf8PathBuf],
    ) -> anyhow::Result<String> {
        let args = Self::args(compose_files, env_files);
        debug!(program = %self.program, ?args, "running compose config");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.working_dir)
            .output()
            .with_context(|| format!("run {} compose config", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "{} compose config failed ({}): {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("compose config output is not UTF-8")
    }
}

/// Fixed compose document for embedding and testing.
#[derive(Debug, Clone)]
pub struct InMemoryComposeSource {
    document: String,
}

impl InMemoryComposeSource {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }
}

impl ComposeSource for InMemoryComposeSource {
    fn canonical_config(
        &self,
        _compose_files: &[Utf8PathBuf],
        _env_files: &[Utf8PathBuf],
    ) -> anyhow::Result<String> {
        Ok(self.document.clone())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn read_existing(&self, path: &Utf8Path) -> anyhow::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read {}", path)),
        }
    }

    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }
}
