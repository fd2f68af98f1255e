#![no_main]

//! Fuzz target for environment layer parsing.
//!
//! Parsing must never panic, and every accepted key must be non-empty.

use libfuzzer_sys::fuzz_target;
use stackfix_envfile::EnvLayer;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(layer) = EnvLayer::parse(".env", s) {
        assert!(layer.vars.keys().all(|key| !key.is_empty()));
    }
});
