//! Project configuration loading for stackfix.
//!
//! Reads the handful of keys stackfix cares about from `.ddev/config.yaml` and merges them with
//! CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use stackfix_core::{BindSettings, CONF_DIR};
use tracing::debug;

/// The config file name, inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Used when neither the config file nor the directory name gives a project name.
const FALLBACK_PROJECT_NAME: &str = "project";

/// The subset of `config.yaml` stackfix reads. Every other key is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project name; defaults to the project directory name.
    pub name: Option<String>,

    /// Bind published ports on all interfaces.
    pub bind_all_interfaces: bool,

    /// Explicit host address for published ports.
    pub host_ip: Option<String>,
}

/// Discover the project config file.
///
/// Returns `None` if `<project_root>/.ddev/config.yaml` does not exist.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONF_DIR).join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ProjectConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string. An empty file is the default config.
pub fn parse_config(contents: &str) -> anyhow::Result<ProjectConfig> {
    if contents.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig = serde_yaml::from_str(contents).context("invalid YAML")?;
    Ok(config)
}

/// Load config from the project root, or return the default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<ProjectConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(ProjectConfig::default()),
    }
}

/// CLI arguments that override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub project: Option<String>,
    pub bind_ip: Option<String>,
    pub bind_all_interfaces: bool,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub project_name: String,
    /// Bind settings without `docker_host`; the caller captures that.
    pub bind: BindSettings,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: ProjectConfig,
}

impl ConfigMerger {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI arguments.
    ///
    /// `--bind-all-interfaces` can only switch all-interface binding on; it cannot turn off a
    /// config file that enables it.
    pub fn merge(self, project_root: &Utf8Path, cli: &CliOverrides) -> MergedConfig {
        let project_name = cli
            .project
            .clone()
            .or(self.config.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| directory_name(project_root));

        MergedConfig {
            project_name,
            bind: BindSettings {
                bind_all_interfaces: cli.bind_all_interfaces || self.config.bind_all_interfaces,
                bind_ip: cli.bind_ip.clone().or(self.config.host_ip),
                docker_host: None,
            },
        }
    }
}

fn directory_name(project_root: &Utf8Path) -> String {
    let named = |path: &Utf8Path| path.file_name().map(str::to_string);
    named(project_root)
        .or_else(|| {
            project_root
                .canonicalize_utf8()
                .ok()
                .and_then(|path| named(&path))
        })
        .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string())
}
