//! Identifier resolution for a two-phase-commit transaction manager.
//!
//! [`Resolver::resolve`] turns an opaque identifier from the transaction
//! log into a [`ResourceDescriptor`]: a local relational resource, an
//! XA-capable resource manager with its connection-level object, or a
//! forwarding proxy for a participant in another service.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod recovery;
pub mod remote;
pub mod resolver;
pub mod rm;
pub mod wire;
pub mod xa;

#[cfg(test)]
mod testkit;

pub use config::ConnectivityConfig;
pub use descriptor::{DescriptorKind, ProbeFailure, ResourceDescriptor};
pub use remote::{RemoteCoordinator, RemoteCoordinatorRegistry, TcpTransport, Transport};
pub use resolver::{LookupError, ResolveError, Resolver, ServiceRegistry, StaticRegistry};
pub use xa::{Vote, XaError, XaResource, Xid};
