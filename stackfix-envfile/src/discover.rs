use camino::{Utf8Path, Utf8PathBuf};
use glob::{glob, Pattern};
use std::io;
use tracing::debug;

/// Environment files in a project configuration directory, in the order they are layered.
///
/// `.env` comes first when it exists, followed by every `.env.*` file sorted by name.
/// `*.example` files are templates and are skipped.
pub fn discover_env_files(conf_dir: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();

    let shared = conf_dir.join(".env");
    if shared.is_file() {
        out.push(shared);
    }

    let pattern = format!("{}/.env.*", Pattern::escape(conf_dir.as_str()));
    debug!(pattern = %pattern, "scanning for environment layers");

    let entries = glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut scoped = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.into_error())?;
        let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
            continue;
        };
        if !path.is_file() || path.as_str().ends_with(".example") {
            debug!(path = %path, "skipping environment file");
            continue;
        }
        scoped.push(path);
    }
    scoped.sort();
    out.extend(scoped);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn missing_directory_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().join("absent")).unwrap();
        assert!(discover_env_files(&dir).unwrap().is_empty());
    }

    #[test]
    fn shared_layer_first_then_sorted_service_layers() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        for name in [".env.web", ".env", ".env.db", ".env.web.example", "config.yaml"] {
            fs::write(dir.join(name), "A=1\n").unwrap();
        }

        let found: Vec<String> = discover_env_files(&dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string())
            .collect();

        assert_eq!(found, vec![".env", ".env.db", ".env.web"]);
    }
}
