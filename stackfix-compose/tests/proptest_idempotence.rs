//! Property-based tests for the fixup pass.
//!
//! These tests verify that:
//! - Applying the fixups twice yields the same document as applying them once
//! - Every non-null service ends up on both platform networks
//! - Output is independent of the order services and networks appear in the input

use camino::Utf8PathBuf;
use fs_err as fs;
use proptest::prelude::*;
use stackfix_compose::{FixupPolicy, Node, PROJECT_NETWORK_KEY, SHARED_NETWORK_KEY, fixup};
use tempfile::TempDir;

fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-z][a-z0-9_-]{0,8}")
        .unwrap()
        .prop_filter("not a YAML keyword", |s| {
            !matches!(s.as_str(), "null" | "true" | "false")
        })
}

fn dedup_by_key<T, K: Ord + Clone>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = std::collections::BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

/// A service definition: optional user networks, environment entries and long-syntax ports.
#[derive(Debug, Clone)]
struct ServiceShape {
    networks: Vec<String>,
    env: Vec<(String, String)>,
    ports: Vec<(u16, Option<String>)>,
    list_form: bool,
}

fn arb_service() -> impl Strategy<Value = ServiceShape> {
    (
        prop::collection::vec(
            prop_oneof![
                Just(SHARED_NETWORK_KEY.to_string()),
                Just(PROJECT_NETWORK_KEY.to_string()),
                arb_name(),
            ],
            0..3,
        ),
        prop::collection::vec(
            (
                prop::string::string_regex(r"[A-Z][A-Z0-9_]{0,6}").unwrap(),
                prop::string::string_regex(r"[a-z0-9$]{0,6}").unwrap(),
            ),
            0..3,
        ),
        prop::collection::vec(
            (1u16..9000, prop::option::of(Just("0.0.0.0".to_string()))),
            0..3,
        ),
        any::<bool>(),
    )
        .prop_map(|(networks, env, ports, list_form)| ServiceShape {
            networks: dedup_by_key(networks, |n| n.clone()),
            env: dedup_by_key(env, |(k, _)| k.clone()),
            ports,
            list_form,
        })
}

fn render_service(name: &str, shape: &ServiceShape) -> String {
    let mut out = format!("  {name}:\n    image: busybox\n");
    if !shape.networks.is_empty() {
        out.push_str("    networks:\n");
        for network in &shape.networks {
            if shape.list_form {
                out.push_str(&format!("      - {network}\n"));
            } else {
                out.push_str(&format!("      {network}: null\n"));
            }
        }
    }
    if !shape.env.is_empty() {
        out.push_str("    environment:\n");
        for (key, value) in &shape.env {
            if shape.list_form {
                out.push_str(&format!("      - \"{key}={value}\"\n"));
            } else {
                out.push_str(&format!("      {key}: \"{value}\"\n"));
            }
        }
    }
    if !shape.ports.is_empty() {
        out.push_str("    ports:\n");
        for (target, host_ip) in &shape.ports {
            out.push_str(&format!("      - target: {target}\n"));
            if let Some(ip) = host_ip {
                out.push_str(&format!("        host_ip: {ip}\n"));
            }
        }
    }
    out
}

fn arb_document() -> impl Strategy<Value = Vec<(String, ServiceShape)>> {
    prop::collection::btree_map(arb_name(), arb_service(), 0..5)
        .prop_map(|services| services.into_iter().collect())
}

fn render_document(services: &[(String, ServiceShape)], networks: &[String]) -> String {
    let mut raw = String::from("services:\n");
    for (name, shape) in services {
        raw.push_str(&render_service(name, shape));
    }
    if !networks.is_empty() {
        raw.push_str("networks:\n");
        for network in networks {
            raw.push_str(&format!("  {network}:\n    driver: bridge\n"));
        }
    }
    raw
}

fn policy_with_layer(dir: &TempDir) -> FixupPolicy {
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let layer = root.join(".env");
    fs::write(&layer, "LAYERED=cost$5\n").unwrap();
    FixupPolicy {
        env_files: vec![layer],
        colors_enabled: false,
        bind_ip: Some("127.0.0.1".to_string()),
        ..FixupPolicy::for_project("prop")
    }
}

proptest! {
    /// Fixing an already fixed document changes nothing.
    #[test]
    fn fixup_is_idempotent(
        services in arb_document(),
        networks in prop::collection::vec(arb_name(), 0..3),
    ) {
        let dir = TempDir::new().unwrap();
        let policy = policy_with_layer(&dir);
        let networks = dedup_by_key(networks, |n| n.clone());
        let raw = render_document(&services, &networks);

        let once = fixup(&raw, &policy).unwrap().to_yaml().unwrap();
        let twice = fixup(&once, &policy).unwrap().to_yaml().unwrap();

        prop_assert_eq!(once, twice);
    }

    /// Every service joins both platform networks and keeps its own.
    #[test]
    fn services_join_platform_networks(services in arb_document()) {
        let dir = TempDir::new().unwrap();
        let policy = policy_with_layer(&dir);
        let raw = render_document(&services, &[]);

        let doc = fixup(&raw, &policy).unwrap();

        for (name, shape) in &services {
            let joined = doc
                .lookup(&["services", name.as_str(), "networks"])
                .and_then(Node::as_mapping)
                .unwrap();
            prop_assert!(joined.contains_key(SHARED_NETWORK_KEY));
            prop_assert!(joined.contains_key(PROJECT_NETWORK_KEY));
            for network in &shape.networks {
                prop_assert!(joined.contains_key(network));
            }
            prop_assert_eq!(
                doc.lookup(&["services", name.as_str(), "environment", "LAYERED"]).and_then(Node::as_str),
                Some("cost$$5")
            );
        }
    }

    /// Reversing service order in the input does not change the output.
    #[test]
    fn output_is_order_independent(services in arb_document()) {
        let dir = TempDir::new().unwrap();
        let policy = policy_with_layer(&dir);

        let forward = render_document(&services, &[]);
        let mut reversed_services = services.clone();
        reversed_services.reverse();
        let reversed = render_document(&reversed_services, &[]);

        prop_assert_eq!(
            fixup(&forward, &policy).unwrap().to_yaml().unwrap(),
            fixup(&reversed, &policy).unwrap().to_yaml().unwrap()
        );
    }
}
