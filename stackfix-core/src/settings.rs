//! Clap-free settings for the render pipeline.

use crate::{CONF_DIR, FULL_COMPOSE_FILE};
use camino::Utf8PathBuf;

/// How published ports are bound on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindSettings {
    /// Bind every port on all interfaces (`0.0.0.0`). Wins over everything else.
    pub bind_all_interfaces: bool,
    /// Explicit host address.
    pub bind_ip: Option<String>,
    /// The caller's `DOCKER_HOST`, used to detect the engine address.
    pub docker_host: Option<String>,
}

/// Settings for the render pipeline.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub project_root: Utf8PathBuf,
    pub project_name: String,

    // Inputs; empty / `None` means discover from the configuration directory.
    pub compose_files: Vec<Utf8PathBuf>,
    pub env_files: Option<Vec<Utf8PathBuf>>,

    pub bind: BindSettings,

    // Output color handling inside containers
    pub colors_enabled: bool,
    pub no_color: Option<String>,

    pub dry_run: bool,
}

impl RenderSettings {
    /// The project's `.ddev` directory.
    pub fn conf_dir(&self) -> Utf8PathBuf {
        self.project_root.join(CONF_DIR)
    }

    pub fn artifact_path(&self) -> Utf8PathBuf {
        self.conf_dir().join(FULL_COMPOSE_FILE)
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            project_name: "project".to_string(),
            compose_files: Vec::new(),
            env_files: None,
            bind: BindSettings::default(),
            colors_enabled: true,
            no_color: None,
            dry_run: false,
        }
    }
}
