//! Resource descriptors: what resolution hands to the transaction manager.
//!
//! A descriptor binds an identifier to a transactional capability and,
//! for XA-capable resource managers, to the connection-level object the
//! enlisting party must eventually close. Descriptors are immutable.

use std::fmt;
use std::sync::Arc;

use crate::remote::RemoteCoordinator;
use crate::rm::{Capability, ManagedResource};
use crate::xa::XaResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Relational resource manager recovered through its own data source.
    Local,
    /// XA-capable relational, messaging or connector resource manager.
    Common,
    /// Participant living in another service.
    Remote,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Local => "local",
            Self::Common => "common",
            Self::Remote => "remote",
        })
    }
}

/// The transactional capability a descriptor carries.
#[derive(Debug, Clone)]
pub(crate) enum Handle {
    Native(Arc<dyn XaResource>),
    Remote(Arc<RemoteCoordinator>),
}

/// A validation probe that failed during resolution.
///
/// Resolution still succeeded with the factory-level handle, but the
/// resource manager may be degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub capability: Capability,
    pub message: String,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} probe failed: {}", self.capability, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    identifier: String,
    kind: DescriptorKind,
    handle: Handle,
    managed: Option<ManagedResource>,
    degraded: Option<ProbeFailure>,
}

impl ResourceDescriptor {
    pub fn local(identifier: impl Into<String>, resource: Arc<dyn XaResource>) -> Self {
        Self {
            identifier: identifier.into(),
            kind: DescriptorKind::Local,
            handle: Handle::Native(resource),
            managed: None,
            degraded: None,
        }
    }

    pub fn common(
        identifier: impl Into<String>,
        resource: Arc<dyn XaResource>,
        managed: ManagedResource,
        degraded: Option<ProbeFailure>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind: DescriptorKind::Common,
            handle: Handle::Native(resource),
            managed: Some(managed),
            degraded,
        }
    }

    pub fn remote(coordinator: Arc<RemoteCoordinator>) -> Self {
        Self {
            identifier: coordinator.identifier().to_string(),
            kind: DescriptorKind::Remote,
            handle: Handle::Remote(coordinator),
            managed: None,
            degraded: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// The capability as a plain [`XaResource`], whichever side it lives on.
    pub fn xa_resource(&self) -> Arc<dyn XaResource> {
        match &self.handle {
            Handle::Native(r) => Arc::clone(r),
            Handle::Remote(c) => Arc::clone(c) as Arc<dyn XaResource>,
        }
    }

    pub fn remote_coordinator(&self) -> Option<&Arc<RemoteCoordinator>> {
        match &self.handle {
            Handle::Remote(c) => Some(c),
            Handle::Native(_) => None,
        }
    }

    /// Connection-level object owned by the enlisting party.
    pub fn managed(&self) -> Option<&ManagedResource> {
        self.managed.as_ref()
    }

    pub fn degraded(&self) -> Option<&ProbeFailure> {
        self.degraded.as_ref()
    }
}
