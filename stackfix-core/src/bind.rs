//! Host address for published ports.

use crate::settings::BindSettings;
use anyhow::{Context, bail};
use std::net::{IpAddr, ToSocketAddrs};
use tracing::{debug, warn};
use url::{Host, Url};

const ALL_INTERFACES: &str = "0.0.0.0";
const LOOPBACK: &str = "127.0.0.1";

/// Address to bind published ports to, or `None` to leave ports alone.
///
/// `bind_all_interfaces` wins, then an explicit `bind_ip`, then the address of the Docker
/// engine. Failing detection only disables port normalization.
pub fn resolve_bind_ip(bind: &BindSettings) -> Option<String> {
    if bind.bind_all_interfaces {
        return Some(ALL_INTERFACES.to_string());
    }
    if let Some(ip) = bind.bind_ip.as_deref().filter(|ip| !ip.is_empty()) {
        return Some(ip.to_string());
    }

    match docker_ip(bind.docker_host.as_deref()) {
        Ok(ip) => {
            debug!(ip = %ip, "detected docker engine address");
            Some(ip)
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "could not detect docker engine address");
            None
        }
    }
}

/// Address of the Docker engine described by a `DOCKER_HOST` value.
///
/// Local sockets (unset, `unix://`, `npipe://`) mean loopback. TCP hosts given by name are
/// resolved, preferring IPv4.
pub fn docker_ip(docker_host: Option<&str>) -> anyhow::Result<String> {
    let Some(docker_host) = docker_host.map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(LOOPBACK.to_string());
    };
    if docker_host.starts_with("unix://") || docker_host.starts_with("npipe://") {
        return Ok(LOOPBACK.to_string());
    }

    let url = Url::parse(docker_host).with_context(|| format!("parse DOCKER_HOST {docker_host}"))?;
    match url.host() {
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        Some(Host::Domain(name)) => resolve_host(name),
        None => bail!("DOCKER_HOST {docker_host} has no host"),
    }
}

fn resolve_host(name: &str) -> anyhow::Result<String> {
    let addrs: Vec<IpAddr> = (name, 0)
        .to_socket_addrs()
        .with_context(|| format!("resolve docker host {name}"))?
        .map(|addr| addr.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .map(IpAddr::to_string)
        .with_context(|| format!("docker host {name} resolved to no addresses"))
}
