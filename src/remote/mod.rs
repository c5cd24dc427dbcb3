//! Remote participants: address classification, forwarding proxies and
//! the registry that keeps one proxy per participant.
//!
//! An identifier that names no local instance may still name a
//! participant in another service, written `host:serviceName:port`.
//! That format is shared with existing recovery logs and must not drift.

mod proxy;
mod registry;
mod transport;

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

pub use proxy::RemoteCoordinator;
pub use registry::RemoteCoordinatorRegistry;
pub use transport::{TcpTransport, Transport, TransportError};

/// `host:serviceName:port`; separators may carry surrounding whitespace.
///
/// Recovery logs written by other participants use this pattern with
/// ASCII `\s` and `\d`, and with `$` also matching before one final line
/// terminator. [`is_remote_identifier`] applies it with those semantics.
pub const REMOTE_ADDRESS_PATTERN: &str = r"^[^:]+\s*:\s*[^:]+\s*:\s*\d+$";

/// [`REMOTE_ADDRESS_PATTERN`] spelled out for the `regex` crate, whose
/// classes are Unicode and whose `$` is end of text only.
const COMPILED_PATTERN: &str = concat!(
    r"^[^:]+[\t\n\x0B\x0C\r ]*:[\t\n\x0B\x0C\r ]*[^:]+[\t\n\x0B\x0C\r ]*:[\t\n\x0B\x0C\r ]*[0-9]+",
    r"(?:\r\n|[\n\r\x{85}\x{2028}\x{2029}])?$",
);

static REMOTE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(COMPILED_PATTERN).expect("remote address pattern is valid"));

/// Whether `identifier` has the shape of a remote participant address.
pub fn is_remote_identifier(identifier: &str) -> bool {
    REMOTE_ADDRESS.is_match(identifier)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("{0:?} is not of the form host:serviceName:port")]
    Malformed(String),
    #[error("port in {0:?} is out of range")]
    PortOutOfRange(String),
}

/// A parsed remote participant identifier.
///
/// Keeps the identifier exactly as written; it is the registry key and
/// the name the participant knows itself by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteAddress {
    identifier: String,
    host: String,
    service: String,
    port: u16,
}

impl RemoteAddress {
    pub fn parse(identifier: &str) -> Result<Self, AddressError> {
        if !is_remote_identifier(identifier) {
            return Err(AddressError::Malformed(identifier.to_string()));
        }

        // The pattern admits exactly two separators.
        let mut parts = identifier.splitn(3, ':').map(str::trim);
        let (Some(host), Some(service), Some(port)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AddressError::Malformed(identifier.to_string()));
        };

        let port = port
            .parse::<u16>()
            .map_err(|_| AddressError::PortOutOfRange(identifier.to_string()))?;

        Ok(Self {
            identifier: identifier.to_string(),
            host: host.to_string(),
            service: service.to_string(),
            port,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

/// Network location and deadlines for one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    addr: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl Endpoint {
    pub fn new(addr: impl Into<String>, connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout,
            io_timeout,
        }
    }

    /// `host:port`.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}
