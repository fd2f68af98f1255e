use crate::{BASE_COMPOSE_FILE, OVERRIDE_COMPOSE_FILE};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use glob::{Pattern, glob};
use tracing::debug;

/// Compose files in a configuration directory, in merge order.
///
/// The generated base file comes first, then `docker-compose.*.yaml` sorted by name, with
/// `docker-compose.override.yaml` always last.
pub fn discover_compose_files(conf_dir: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();

    let base = conf_dir.join(BASE_COMPOSE_FILE);
    if base.is_file() {
        out.push(base);
    }

    let pattern = format!("{}/docker-compose.*.yaml", Pattern::escape(conf_dir.as_str()));
    debug!(pattern = %pattern, "scanning for compose files");

    let mut found = Vec::new();
    let mut override_file = None;
    for entry in glob(&pattern).with_context(|| format!("invalid glob {pattern}"))? {
        let path = entry.context("scan compose files")?;
        let path = Utf8PathBuf::from_path_buf(path)
            .map_err(|p| anyhow::anyhow!("non-UTF-8 compose file path: {}", p.display()))?;
        if !path.is_file() {
            continue;
        }
        if path.file_name() == Some(OVERRIDE_COMPOSE_FILE) {
            override_file = Some(path);
        } else {
            found.push(path);
        }
    }
    found.sort();
    out.extend(found);
    out.extend(override_file);

    Ok(out)
}
