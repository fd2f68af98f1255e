use camino::Utf8PathBuf;

/// Name of the platform-wide network every project joins.
pub const SHARED_NETWORK_NAME: &str = "ddev_default";

/// Inputs that steer one fixup pass.
///
/// Everything the engine would otherwise read from the process (environment variables, detected
/// addresses) is captured here by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixupPolicy {
    /// Name forced onto `networks.ddev_default`.
    pub shared_network: String,
    /// Name forced onto `networks.default`.
    pub project_network: String,
    /// Environment layers, applied in this order.
    pub env_files: Vec<Utf8PathBuf>,
    pub colors_enabled: bool,
    /// The caller's `NO_COLOR` value, passed through when colors are disabled.
    pub no_color: Option<String>,
    /// Address for port bindings without a `host_ip`. `None` or empty skips port normalization.
    pub bind_ip: Option<String>,
}

impl FixupPolicy {
    pub fn for_project(project_name: &str) -> Self {
        Self {
            shared_network: SHARED_NETWORK_NAME.to_string(),
            project_network: project_network_name(project_name),
            env_files: Vec::new(),
            colors_enabled: true,
            no_color: None,
            bind_ip: None,
        }
    }

    pub(crate) fn effective_bind_ip(&self) -> Option<&str> {
        self.bind_ip.as_deref().filter(|ip| !ip.is_empty())
    }
}

/// Compose project name for a project: `ddev-<name>`, lowercased, dots removed, and restricted
/// to the characters compose accepts.
pub fn compose_project_name(project_name: &str) -> String {
    format!("ddev-{project_name}")
        .to_lowercase()
        .chars()
        .filter(|&c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// Name of the project's own network (`networks.default`).
pub fn project_network_name(project_name: &str) -> String {
    format!("{}_default", compose_project_name(project_name))
}
