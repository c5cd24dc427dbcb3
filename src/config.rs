//! Connectivity configuration for remote-participant proxies.
//!
//! Supplied by whoever owns the resolver (the transaction manager, or the
//! CLI from its flags). Read once per proxy, at construction.

use std::collections::HashMap;
use std::time::Duration;

use crate::remote::{Endpoint, RemoteAddress};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityConfig {
    pub connect_timeout: Duration,
    /// Applies to each read and write on the participant socket.
    pub io_timeout: Duration,
    /// Service name → `host:port` overrides, for participants reachable
    /// at a different address than the one recorded in their identifier
    /// (NAT, service mesh sidecar).
    pub endpoints: HashMap<String, String>,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
            endpoints: HashMap::new(),
        }
    }
}

impl ConnectivityConfig {
    /// Parse a `service=host:port` override.
    pub fn parse_endpoint_override(spec: &str) -> Result<(String, String), String> {
        let (service, addr) = spec
            .split_once('=')
            .ok_or_else(|| format!("expected service=host:port, got {spec:?}"))?;
        let service = service.trim();
        let addr = addr.trim();
        let Some((host, port)) = addr.rsplit_once(':') else {
            return Err(format!("endpoint for {service:?} has no port: {addr:?}"));
        };
        if service.is_empty() || host.is_empty() {
            return Err(format!("empty service or host in {spec:?}"));
        }
        port.parse::<u16>()
            .map_err(|e| format!("invalid port in {spec:?}: {e}"))?;
        Ok((service.to_string(), addr.to_string()))
    }

    /// Where to send calls for `address`.
    pub fn endpoint_for(&self, address: &RemoteAddress) -> Endpoint {
        match self.endpoints.get(address.service()) {
            Some(addr) => Endpoint::new(addr.clone(), self.connect_timeout, self.io_timeout),
            None => Endpoint::new(
                format!("{}:{}", address.host(), address.port()),
                self.connect_timeout,
                self.io_timeout,
            ),
        }
    }
}
