//! Filesystem tests for environment layer loading.

use camino::Utf8PathBuf;
use stackfix_envfile::{FsLayerSource, LayerError, LayerScope, LayerSource, read_layer};
use std::fs;
use tempfile::TempDir;

fn conf_dir(temp: &TempDir) -> Utf8PathBuf {
    let dir = Utf8PathBuf::from_path_buf(temp.path().join(".ddev")).unwrap();
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn missing_file_is_not_found() {
    let temp = tempfile::tempdir().unwrap();
    let path = conf_dir(&temp).join(".env");

    let err = read_layer(&path).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.path(), path.as_path());
}

#[test]
fn directory_is_a_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = conf_dir(&temp).join(".env.web");
    fs::create_dir_all(&path).unwrap();

    let err = read_layer(&path).unwrap_err();
    assert!(matches!(err, LayerError::Read { .. }));
    assert!(!err.is_not_found());
}

#[test]
fn non_utf8_contents_are_a_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = conf_dir(&temp).join(".env");
    fs::write(&path, [0x41, 0x3d, 0xff, 0xfe, 0x0a]).unwrap();

    let err = read_layer(&path).unwrap_err();
    assert!(matches!(err, LayerError::Read { .. }));
}

#[test]
fn reads_service_layer() {
    let temp = tempfile::tempdir().unwrap();
    let path = conf_dir(&temp).join(".env.web");
    fs::write(&path, "BAR=2\nPRICE=5$\n").unwrap();

    let layer = FsLayerSource.read_layer(&path).unwrap();
    assert_eq!(LayerScope::from_path(&layer.path), LayerScope::Service("web".to_string()));
    assert_eq!(layer.vars.get("BAR").map(String::as_str), Some("2"));
    assert_eq!(layer.vars.get("PRICE").map(String::as_str), Some("5$"));
    assert!(layer.warnings.is_empty());
}

#[test]
fn parse_error_names_path_and_line() {
    let temp = tempfile::tempdir().unwrap();
    let path = conf_dir(&temp).join(".env");
    fs::write(&path, "OK=1\n\nbroken line\n").unwrap();

    let err = read_layer(&path).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains(path.as_str()), "{msg}");
    assert!(msg.contains("line 3"), "{msg}");
}
