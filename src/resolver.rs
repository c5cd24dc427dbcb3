//! Identifier resolution.
//!
//! An identifier names either an instance in the service registry or,
//! failing that, a remote participant shaped `host:service:port`.
//! Registered instances resolve through the strategy dispatcher and are
//! cached; remote participants resolve to the registry's shared proxy.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::ResolutionCache;
use crate::descriptor::ResourceDescriptor;
use crate::dispatch::Dispatcher;
use crate::remote::{AddressError, RemoteAddress, RemoteCoordinatorRegistry};
use crate::rm::ServiceInstance;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no instance named {0}")]
    NotFound(String),
    #[error("registry lookup failed: {0}")]
    Failed(String),
}

/// Named-instance lookup, supplied by the owner of the resolver.
pub trait ServiceRegistry: Send + Sync {
    fn lookup(&self, name: &str) -> Result<Arc<ServiceInstance>, LookupError>;
}

/// In-memory [`ServiceRegistry`].
#[derive(Debug, Default)]
pub struct StaticRegistry {
    instances: RwLock<HashMap<String, Arc<ServiceInstance>>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `instance` under its own name, replacing any previous one.
    pub fn register(&self, instance: ServiceInstance) -> Arc<ServiceInstance> {
        let instance = Arc::new(instance);
        self.instances
            .write()
            .insert(instance.name().to_string(), Arc::clone(&instance));
        instance
    }
}

impl ServiceRegistry for StaticRegistry {
    fn lookup(&self, name: &str) -> Result<Arc<ServiceInstance>, LookupError> {
        self.instances
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Not registered and not a remote address.
    #[error("{identifier}: not found")]
    NotFound { identifier: String },

    /// Registered, but no strategy recognizes the instance.
    #[error("{identifier}: unsupported resource type")]
    UnsupportedResourceType { identifier: String },

    #[error("{identifier}: {reason}")]
    Unexpected { identifier: String, reason: String },
}

impl ResolveError {
    pub fn identifier(&self) -> &str {
        match self {
            Self::NotFound { identifier }
            | Self::UnsupportedResourceType { identifier }
            | Self::Unexpected { identifier, .. } => identifier,
        }
    }
}

pub struct Resolver {
    registry: Arc<dyn ServiceRegistry>,
    coordinators: Arc<RemoteCoordinatorRegistry>,
    dispatcher: Dispatcher,
    cache: ResolutionCache,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("coordinators", &self.coordinators)
            .field("dispatcher", &self.dispatcher)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        coordinators: Arc<RemoteCoordinatorRegistry>,
    ) -> Self {
        Self {
            registry,
            coordinators,
            dispatcher: Dispatcher::new(),
            cache: ResolutionCache::new(),
        }
    }

    /// Resolve `identifier` to a descriptor.
    ///
    /// Blocks on resource-manager or registry I/O. Safe to call from many
    /// threads at once; a given registered identifier is dispatched at
    /// most once until invalidated.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<ResourceDescriptor>, ResolveError> {
        let result = match self.registry.lookup(identifier) {
            Ok(instance) => self.resolve_local(identifier, &instance),
            Err(LookupError::NotFound(_)) => self.resolve_remote(identifier),
            Err(e @ LookupError::Failed(_)) => Err(ResolveError::Unexpected {
                identifier: identifier.to_string(),
                reason: e.to_string(),
            }),
        };

        match &result {
            Ok(descriptor) => {
                tracing::debug!(identifier, kind = %descriptor.kind(), "resolved");
            }
            Err(e) => tracing::error!(identifier, error = %e, "resolution failed"),
        }
        result
    }

    fn resolve_local(
        &self,
        identifier: &str,
        instance: &ServiceInstance,
    ) -> Result<Arc<ResourceDescriptor>, ResolveError> {
        self.cache.get_or_try_insert_with(identifier, || {
            match self.dispatcher.dispatch(identifier, instance) {
                Ok(Some(descriptor)) => Ok(descriptor),
                Ok(None) => Err(ResolveError::UnsupportedResourceType {
                    identifier: identifier.to_string(),
                }),
                Err(e) => Err(ResolveError::Unexpected {
                    identifier: identifier.to_string(),
                    reason: e.to_string(),
                }),
            }
        })
    }

    fn resolve_remote(&self, identifier: &str) -> Result<Arc<ResourceDescriptor>, ResolveError> {
        let address = RemoteAddress::parse(identifier).map_err(|e| {
            if let AddressError::PortOutOfRange(_) = e {
                tracing::debug!(identifier, error = %e, "remote-shaped identifier rejected");
            }
            ResolveError::NotFound {
                identifier: identifier.to_string(),
            }
        })?;
        let coordinator = self.coordinators.get_or_create(&address);
        Ok(Arc::new(ResourceDescriptor::remote(coordinator)))
    }

    /// Forget the cached descriptor for `identifier`.
    ///
    /// The descriptor itself stays valid for anyone still holding it.
    pub fn invalidate(&self, identifier: &str) -> Option<Arc<ResourceDescriptor>> {
        self.cache.invalidate(identifier)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn coordinators(&self) -> &Arc<RemoteCoordinatorRegistry> {
        &self.coordinators
    }
}
