//! The environment a service receives from its layers, as the fixup pass would inject it.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use stackfix_compose::escape_dollars;
use stackfix_envfile::{LayerScope, LayerSource, discover_env_files};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceEnvironment {
    pub service: String,
    /// Layers that contributed, in application order.
    pub layers: Vec<Utf8PathBuf>,
    /// Merged variables; later layers win. Values are `$`-escaped.
    pub vars: BTreeMap<String, String>,
}

impl ServiceEnvironment {
    /// `KEY=VALUE` lines, sorted by key.
    pub fn to_text(&self) -> String {
        self.vars
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect()
    }
}

/// Merge every layer in `conf_dir` that applies to `service`.
pub fn service_environment(
    conf_dir: &Utf8Path,
    service: &str,
    source: &dyn LayerSource,
) -> anyhow::Result<ServiceEnvironment> {
    let files = discover_env_files(conf_dir)
        .with_context(|| format!("discover environment files in {conf_dir}"))?;

    let mut out = ServiceEnvironment {
        service: service.to_string(),
        ..ServiceEnvironment::default()
    };
    for path in files {
        if !LayerScope::from_path(&path).applies_to(service) {
            debug!(path = %path, service, "layer does not apply");
            continue;
        }

        let layer = match source.read_layer(&path) {
            Ok(layer) => layer,
            Err(err) if err.is_not_found() => continue,
            Err(err) => return Err(err).with_context(|| format!("read {path}")),
        };
        for warning in &layer.warnings {
            warn!("{warning}");
        }
        for (key, value) in &layer.vars {
            out.vars.insert(key.clone(), escape_dollars(value));
        }
        out.layers.push(path);
    }
    Ok(out)
}
