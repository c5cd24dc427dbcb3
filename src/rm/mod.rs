//! Resource-manager client surfaces.
//!
//! The relational, messaging and connector client libraries are black
//! boxes. Each exposes a small capability surface that ends in an
//! [`XaResource`]; the dispatcher only ever talks to these traits.
//!
//! A registered service instance is a [`ServiceInstance`]: a named set of
//! capabilities. Strategy selection inspects which capabilities are
//! present, never the instance name.

pub mod recovered;

use std::fmt;
use std::sync::Arc;

use crate::xa::{XaResource, Xid};

pub use recovered::RecoveredResource;

/// Failure raised by a resource-manager client library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RmError(pub String);

impl RmError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Something that must be released exactly once by its owner.
pub trait Closeable: Send {
    fn close(&mut self) -> Result<(), RmError>;
}

// -- Relational --

/// Physical connection to a relational store.
///
/// Beyond its lifecycle, the recovery path only needs the store's branch
/// records: rows written inside a local transaction that joined a global
/// one, present iff that local transaction committed.
pub trait Connection: Closeable {
    fn recorded_branches(&mut self) -> Result<Vec<Xid>, RmError>;

    /// Delete the branch record. Returns whether a record existed.
    fn forget_branch(&mut self, xid: &Xid) -> Result<bool, RmError>;
}

/// Plain (non-XA) relational resource manager.
pub trait DataSource: Send + Sync + fmt::Debug {
    fn connection(&self) -> Result<Box<dyn Connection>, RmError>;
}

/// A resource that already owns a relational data source and is
/// recoverable through it.
pub trait DataSourceHolder: Send + Sync + fmt::Debug {
    fn data_source(&self) -> Arc<dyn DataSource>;
}

/// XA-capable relational resource manager.
pub trait XaDataSource: Send + Sync + fmt::Debug {
    fn xa_connection(&self) -> Result<Arc<dyn XaConnection>, RmError>;
}

pub trait XaConnection: Send + Sync + fmt::Debug {
    /// Open the physical connection backing this XA connection.
    fn connection(&self) -> Result<Box<dyn Connection>, RmError>;

    fn xa_resource(&self) -> Result<Arc<dyn XaResource>, RmError>;

    fn close(&self) -> Result<(), RmError>;
}

// -- Messaging --

/// XA-capable messaging resource manager.
pub trait XaConnectionFactory: Send + Sync + fmt::Debug {
    fn create_xa_connection(&self) -> Result<Arc<dyn XaMessagingConnection>, RmError>;
}

pub trait XaMessagingConnection: Send + Sync + fmt::Debug {
    fn create_xa_session(&self) -> Result<Box<dyn XaSession>, RmError>;

    fn close(&self) -> Result<(), RmError>;
}

/// Session scoped to its parent connection; closing the connection
/// releases it.
pub trait XaSession: Send {
    /// Open the plain session backing this XA session.
    fn session(&self) -> Result<Box<dyn Session>, RmError>;

    fn xa_resource(&self) -> Result<Arc<dyn XaResource>, RmError>;
}

pub trait Session: Closeable {}

// -- Connector --

/// XA-capable connector resource manager.
pub trait ManagedConnectionFactory: Send + Sync + fmt::Debug {
    fn create_managed_connection(&self) -> Result<Arc<dyn ManagedConnection>, RmError>;
}

pub trait ManagedConnection: Send + Sync + fmt::Debug {
    /// Open an application-level connection handle.
    fn connection(&self) -> Result<Box<dyn CciConnection>, RmError>;

    fn xa_resource(&self) -> Result<Arc<dyn XaResource>, RmError>;

    fn close(&self) -> Result<(), RmError>;
}

pub trait CciConnection: Closeable {}

/// The connection-level object handed off with a common descriptor.
///
/// The enlisting transaction manager owns it from then on and closes it
/// once the branch is complete.
#[derive(Debug, Clone)]
pub enum ManagedResource {
    XaConnection(Arc<dyn XaConnection>),
    XaMessagingConnection(Arc<dyn XaMessagingConnection>),
    ManagedConnection(Arc<dyn ManagedConnection>),
}

impl ManagedResource {
    pub fn close(&self) -> Result<(), RmError> {
        match self {
            Self::XaConnection(c) => c.close(),
            Self::XaMessagingConnection(c) => c.close(),
            Self::ManagedConnection(c) => c.close(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::XaConnection(_) => "xa_connection",
            Self::XaMessagingConnection(_) => "xa_messaging_connection",
            Self::ManagedConnection(_) => "managed_connection",
        }
    }
}

/// Capability tags, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    LocalRecoverable,
    Relational,
    XaRelational,
    XaMessaging,
    XaConnector,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LocalRecoverable => "local_recoverable",
            Self::Relational => "relational",
            Self::XaRelational => "xa_relational",
            Self::XaMessaging => "xa_messaging",
            Self::XaConnector => "xa_connector",
        };
        f.write_str(s)
    }
}

/// A named instance from the service registry.
///
/// An instance may expose several capabilities at once (a pooled data
/// source that is also XA-capable, say); the dispatcher picks by
/// priority. An instance with none is an unrecognized resource type.
#[derive(Debug, Clone, Default)]
pub struct ServiceInstance {
    name: String,
    local: Option<Arc<dyn DataSourceHolder>>,
    data_source: Option<Arc<dyn DataSource>>,
    xa_data_source: Option<Arc<dyn XaDataSource>>,
    xa_connection_factory: Option<Arc<dyn XaConnectionFactory>>,
    managed_connection_factory: Option<Arc<dyn ManagedConnectionFactory>>,
}

impl ServiceInstance {
    /// An instance exposing no transactional capability.
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_data_source_holder(mut self, holder: Arc<dyn DataSourceHolder>) -> Self {
        self.local = Some(holder);
        self
    }

    pub fn with_data_source(mut self, ds: Arc<dyn DataSource>) -> Self {
        self.data_source = Some(ds);
        self
    }

    pub fn with_xa_data_source(mut self, ds: Arc<dyn XaDataSource>) -> Self {
        self.xa_data_source = Some(ds);
        self
    }

    pub fn with_xa_connection_factory(mut self, f: Arc<dyn XaConnectionFactory>) -> Self {
        self.xa_connection_factory = Some(f);
        self
    }

    pub fn with_managed_connection_factory(mut self, f: Arc<dyn ManagedConnectionFactory>) -> Self {
        self.managed_connection_factory = Some(f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_source_holder(&self) -> Option<&Arc<dyn DataSourceHolder>> {
        self.local.as_ref()
    }

    pub fn data_source(&self) -> Option<&Arc<dyn DataSource>> {
        self.data_source.as_ref()
    }

    pub fn xa_data_source(&self) -> Option<&Arc<dyn XaDataSource>> {
        self.xa_data_source.as_ref()
    }

    pub fn xa_connection_factory(&self) -> Option<&Arc<dyn XaConnectionFactory>> {
        self.xa_connection_factory.as_ref()
    }

    pub fn managed_connection_factory(&self) -> Option<&Arc<dyn ManagedConnectionFactory>> {
        self.managed_connection_factory.as_ref()
    }
}
