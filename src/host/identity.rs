//! Host name / IP resolution.

use std::net::{IpAddr, ToSocketAddrs};

use lazy_static::lazy_static;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostIdentity {
    pub host_ip: String,
    pub host_name: String,
}

impl HostIdentity {
    pub fn new(host_ip: &str, host_name: &str) -> Self {
        Self {
            host_ip: host_ip.to_string(),
            host_name: host_name.to_string(),
        }
    }

    /// Resolve the local host. Never fails; unresolvable parts are empty.
    pub fn resolve() -> Self {
        let host_name = match hostname::get() {
            Ok(name) => name.to_string_lossy().into_owned(),
            Err(e) => {
                log::warn!("HOST_NAME_UNRESOLVED error={}", e);
                return Self::default();
            }
        };

        let host_ip = match resolve_ip(&host_name) {
            Some(ip) => ip.to_string(),
            None => {
                log::warn!("HOST_IP_UNRESOLVED host_name={}", host_name);
                String::new()
            }
        };

        log::info!("HOST_IDENTITY_RESOLVED host_name={} host_ip={}", host_name, host_ip);

        Self { host_ip, host_name }
    }

    pub fn is_empty(&self) -> bool {
        self.host_ip.is_empty() && self.host_name.is_empty()
    }
}

/// Resolve a host name to an address, preferring IPv4.
pub fn resolve_ip(host_name: &str) -> Option<IpAddr> {
    if host_name.is_empty() {
        return None;
    }
    let addrs: Vec<IpAddr> = (host_name, 0)
        .to_socket_addrs()
        .ok()?
        .map(|addr| addr.ip())
        .collect();
    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

lazy_static! {
    static ref LOCAL_HOST: HostIdentity = HostIdentity::resolve();
}

/// Process-wide cached identity of this host.
pub fn local_host() -> &'static HostIdentity {
    &LOCAL_HOST
}
