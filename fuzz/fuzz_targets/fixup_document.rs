#![no_main]

//! Fuzz target for the compose fixup pass.
//!
//! Arbitrary bytes are treated as a compose document and fixed up with an arbitrary policy.
//! The pass must never panic, and whatever it accepts must be a fixed point.

use arbitrary::Arbitrary;
use camino::{Utf8Path, Utf8PathBuf};
use libfuzzer_sys::fuzz_target;
use stackfix_compose::{FixupPolicy, fixup_with};
use stackfix_envfile::{EnvLayer, LayerError, LayerSource};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    document: &'a str,
    layer: &'a str,
    project: &'a str,
    colors_enabled: bool,
    bind_ip: Option<&'a str>,
}

/// Serves the same contents for every layer path.
struct FixedLayers<'a>(&'a str);

impl LayerSource for FixedLayers<'_> {
    fn read_layer(&self, path: &Utf8Path) -> Result<EnvLayer, LayerError> {
        EnvLayer::parse(path, self.0)
    }
}

fuzz_target!(|input: Input<'_>| {
    let policy = FixupPolicy {
        env_files: vec![Utf8PathBuf::from(".ddev/.env")],
        colors_enabled: input.colors_enabled,
        bind_ip: input.bind_ip.map(str::to_string),
        ..FixupPolicy::for_project(input.project)
    };
    let layers = FixedLayers(input.layer);

    let Ok(doc) = fixup_with(input.document, &policy, &layers) else {
        return;
    };
    let Ok(once) = doc.to_yaml() else {
        return;
    };

    let again = fixup_with(&once, &policy, &layers).expect("fixed output re-parses");
    let twice = again.to_yaml().expect("fixed output re-serializes");
    assert_eq!(once, twice, "fixup is not idempotent");
});
