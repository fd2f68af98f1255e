//! The fixup pass: rewrite canonical `docker compose config` output so every project stack
//! satisfies the platform's network, environment and port-binding invariants.

use crate::document::ComposeDocument;
use crate::error::{FixupError, FixupResult};
use crate::node::{ListForm, Mapping, Node, ensure_mapping, section, section_mut};
use crate::policy::FixupPolicy;
use stackfix_envfile::{EnvLayer, FsLayerSource, LayerScope, LayerSource};
use tracing::debug;

/// Network key that must point at the shared platform network.
pub const SHARED_NETWORK_KEY: &str = "ddev_default";
/// Network key that must point at the project's own network.
pub const PROJECT_NETWORK_KEY: &str = "default";
/// Label marking networks owned (and prunable) by the platform.
pub const PLATFORM_LABEL: &str = "com.ddev.platform";
pub const PLATFORM_LABEL_VALUE: &str = "ddev";

const NO_COLOR: &str = "NO_COLOR";

/// Parse `raw` and apply every fixup, reading environment layers from disk.
pub fn fixup(raw: &str, policy: &FixupPolicy) -> FixupResult<ComposeDocument> {
    fixup_with(raw, policy, &FsLayerSource)
}

/// Parse `raw` and apply every fixup, reading environment layers from `layers`.
pub fn fixup_with(
    raw: &str,
    policy: &FixupPolicy,
    layers: &dyn LayerSource,
) -> FixupResult<ComposeDocument> {
    let mut doc = ComposeDocument::parse(raw)?;
    fixup_document(&mut doc, policy, layers)?;
    Ok(doc)
}

/// Apply every fixup to an already parsed document.
///
/// Fixups run against a working copy that replaces the document only on success, so any
/// error (an unreadable layer, a malformed service) leaves `doc` untouched.
pub fn fixup_document(
    doc: &mut ComposeDocument,
    policy: &FixupPolicy,
    layers: &dyn LayerSource,
) -> FixupResult<()> {
    let service_names: Vec<String> = match section(doc.root(), "services")? {
        Some(services) => services
            .iter()
            .filter(|(_, service)| !service.is_null())
            .map(|(name, _)| name.clone())
            .collect(),
        None => Vec::new(),
    };
    let loaded = load_layers(policy, &service_names, layers)?;

    let mut root = doc.root().clone();
    normalize_networks(&mut root, policy)?;

    if let Some(services) = section_mut(&mut root, "services")? {
        for (name, service) in services.iter_mut() {
            fixup_service(name, service, policy, &loaded)?;
        }
    }
    *doc.root_mut() = root;

    debug!(
        services = service_names.len(),
        layers = loaded.len(),
        "compose fixup complete"
    );
    Ok(())
}

/// Escape `$` the way `docker compose config` does, so values are never interpolated again.
pub fn escape_dollars(value: &str) -> String {
    value.replace('$', "$$")
}

struct ScopedLayer {
    scope: LayerScope,
    layer: EnvLayer,
}

fn load_layers(
    policy: &FixupPolicy,
    service_names: &[String],
    source: &dyn LayerSource,
) -> FixupResult<Vec<ScopedLayer>> {
    let mut out = Vec::new();
    for path in &policy.env_files {
        let scope = LayerScope::from_path(path);
        if !service_names.iter().any(|name| scope.applies_to(name)) {
            continue;
        }

        match source.read_layer(path) {
            Ok(layer) => out.push(ScopedLayer { scope, layer }),
            Err(err) if err.is_not_found() => {
                debug!(path = %path, "environment layer absent, skipping");
            }
            Err(source) => {
                return Err(FixupError::EnvFileRead {
                    path: path.clone(),
                    source,
                });
            }
        }
    }
    Ok(out)
}

fn normalize_networks(root: &mut Mapping, policy: &FixupPolicy) -> FixupResult<()> {
    let Some(networks) = section_mut(root, "networks")? else {
        return Ok(());
    };

    for (name, network) in networks.iter_mut() {
        let path = format!("networks.{name}");
        let network = match network {
            Node::Null => continue,
            Node::Mapping(map) => map,
            other => return Err(FixupError::shape(&path, "a mapping", other)),
        };

        // Users cannot override identity or ownership of the two built-in networks.
        if name == SHARED_NETWORK_KEY {
            network.insert("name".to_string(), Node::string(&policy.shared_network));
            network.insert("external".to_string(), Node::bool(true));
        } else if name == PROJECT_NETWORK_KEY {
            network.insert("name".to_string(), Node::string(&policy.project_network));
            network.remove("external");
        }

        if !is_external(network) {
            let labels = ensure_mapping(
                network,
                "labels",
                &format!("{path}.labels"),
                ListForm::KeyValue,
            )?;
            labels.insert(
                PLATFORM_LABEL.to_string(),
                Node::string(PLATFORM_LABEL_VALUE),
            );
        }
    }
    Ok(())
}

fn is_external(network: &Mapping) -> bool {
    network.get("external").and_then(Node::as_bool) == Some(true)
}

fn fixup_service(
    name: &str,
    service: &mut Node,
    policy: &FixupPolicy,
    layers: &[ScopedLayer],
) -> FixupResult<()> {
    let path = format!("services.{name}");
    let service = match service {
        Node::Null => return Ok(()),
        Node::Mapping(map) => map,
        other => return Err(FixupError::shape(&path, "a mapping", other)),
    };

    let networks = ensure_mapping(
        service,
        "networks",
        &format!("{path}.networks"),
        ListForm::Names,
    )?;
    networks
        .entry(SHARED_NETWORK_KEY.to_string())
        .or_insert(Node::Null);
    networks
        .entry(PROJECT_NETWORK_KEY.to_string())
        .or_insert(Node::Null);

    let env_path = format!("{path}.environment");
    for scoped in layers.iter().filter(|l| l.scope.applies_to(name)) {
        if scoped.layer.is_empty() {
            continue;
        }
        let environment = ensure_mapping(service, "environment", &env_path, ListForm::KeyValue)?;
        for (key, value) in &scoped.layer.vars {
            environment.insert(key.clone(), Node::string(escape_dollars(value)));
        }
    }

    if !policy.colors_enabled {
        let environment = ensure_mapping(service, "environment", &env_path, ListForm::KeyValue)?;
        environment
            .entry(NO_COLOR.to_string())
            .or_insert_with(|| Node::string(policy.no_color.clone().unwrap_or_default()));
    }

    if let Some(bind_ip) = policy.effective_bind_ip() {
        normalize_ports(service, bind_ip, &path)?;
    }

    Ok(())
}

fn normalize_ports(service: &mut Mapping, bind_ip: &str, path: &str) -> FixupResult<()> {
    let ports = match service.get_mut("ports") {
        None | Some(Node::Null) => return Ok(()),
        Some(Node::Sequence(ports)) => ports,
        Some(other) => {
            return Err(FixupError::shape(
                &format!("{path}.ports"),
                "a sequence",
                other,
            ));
        }
    };

    // Short-syntax strings ("3000:3000") are left alone.
    for port in ports.iter_mut() {
        if let Node::Mapping(binding) = port {
            binding
                .entry("host_ip".to_string())
                .or_insert_with(|| Node::string(bind_ip));
        }
    }
    Ok(())
}
