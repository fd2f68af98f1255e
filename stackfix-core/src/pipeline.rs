//! The render pipeline, extracted from the CLI.
//!
//! I/O-agnostic: compose canonicalization and artifact access go through the port traits.
//! Environment layers are read from disk by the engine.

use crate::bind::resolve_bind_ip;
use crate::discover::discover_compose_files;
use crate::ports::{ComposeSource, WritePort};
use crate::settings::RenderSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use stackfix_compose::{ComposeDocument, FixupPolicy, fixup};
use stackfix_envfile::discover_env_files;
use tracing::{debug, info};

/// Outcome of `run_render`.
#[derive(Debug)]
pub struct RenderOutcome {
    pub artifact_path: Utf8PathBuf,
    pub compose_files: Vec<Utf8PathBuf>,
    pub env_files: Vec<Utf8PathBuf>,
    pub bind_ip: Option<String>,
    pub document: ComposeDocument,
    /// Serialized corrected document.
    pub yaml: String,
    /// Unified diff against the previous artifact; empty when unchanged.
    pub patch: String,
    pub changed: bool,
    pub written: bool,
}

/// Run the render pipeline: discover inputs, canonicalize, fix up, and write the artifact.
pub fn run_render(
    settings: &RenderSettings,
    compose: &dyn ComposeSource,
    writer: &dyn WritePort,
) -> anyhow::Result<RenderOutcome> {
    // Compose runs from the configuration directory, so every path it sees must be absolute.
    let settings = &RenderSettings {
        project_root: absolute(&settings.project_root)?,
        ..settings.clone()
    };
    let conf_dir = settings.conf_dir();

    let compose_files = if settings.compose_files.is_empty() {
        discover_compose_files(&conf_dir)?
    } else {
        absolute_all(&settings.compose_files)?
    };
    let env_files = match &settings.env_files {
        Some(files) => absolute_all(files)?,
        None => discover_env_files(&conf_dir)
            .with_context(|| format!("discover environment files in {conf_dir}"))?,
    };
    debug!(
        compose_files = compose_files.len(),
        env_files = env_files.len(),
        "render inputs"
    );

    let raw = compose
        .canonical_config(&compose_files, &env_files)
        .context("canonicalize compose files")?;

    let bind_ip = resolve_bind_ip(&settings.bind);
    let policy = FixupPolicy {
        env_files: env_files.clone(),
        colors_enabled: settings.colors_enabled,
        no_color: settings.no_color.clone(),
        bind_ip: bind_ip.clone(),
        ..FixupPolicy::for_project(&settings.project_name)
    };

    let document = fixup(&raw, &policy).context("fix up compose document")?;
    let yaml = document.to_yaml().context("serialize compose document")?;

    let artifact_path = settings.artifact_path();
    let previous = writer.read_existing(&artifact_path)?;
    let changed = previous.as_deref() != Some(yaml.as_str());
    let patch = if changed {
        render_patch(
            &artifact_path,
            previous.as_deref().unwrap_or_default(),
            &yaml,
            false,
        )
    } else {
        String::new()
    };

    let written = changed && !settings.dry_run;
    if written {
        writer.create_dir_all(&conf_dir)?;
        writer.write_file(&artifact_path, yaml.as_bytes())?;
        info!(path = %artifact_path, "wrote compose artifact");
    } else if changed {
        info!(path = %artifact_path, "dry run, compose artifact not written");
    } else {
        info!(path = %artifact_path, "compose artifact up to date");
    }

    Ok(RenderOutcome {
        artifact_path,
        compose_files,
        env_files,
        bind_ip,
        document,
        yaml,
        patch,
        changed,
        written,
    })
}

/// `path` resolved against the current working directory, without following symlinks.
fn absolute(path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let resolved =
        std::path::absolute(path).with_context(|| format!("resolve {path} to an absolute path"))?;
    Utf8PathBuf::try_from(resolved).with_context(|| format!("resolve {path} to a UTF-8 path"))
}

fn absolute_all(paths: &[Utf8PathBuf]) -> anyhow::Result<Vec<Utf8PathBuf>> {
    paths.iter().map(|path| absolute(path)).collect()
}

/// Unified diff between two versions of `path`, git-style headers included.
pub fn render_patch(path: &Utf8Path, old: &str, new: &str, color: bool) -> String {
    if old == new {
        return String::new();
    }

    let mut formatter = PatchFormatter::new();
    if color {
        formatter = formatter.with_color();
    }

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    let patch = diffy::create_patch(old, new);
    out.push_str(&formatter.fmt_patch(&patch).to_string());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
