//! Registry of remote-participant proxies.
//!
//! One proxy per identifier for the life of the process, so every
//! enlistment and recovery call for a participant routes through the
//! same stub. Construction happens under the map's entry lock: any
//! number of concurrent first calls build exactly one proxy.
//!
//! Entries are never dropped on their own; [`evict`] is the hook for an
//! owner that retires participants.
//!
//! [`evict`]: RemoteCoordinatorRegistry::evict

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::{RemoteAddress, RemoteCoordinator, Transport};
use crate::config::ConnectivityConfig;

pub struct RemoteCoordinatorRegistry {
    stubs: DashMap<String, Arc<RemoteCoordinator>>,
    config: ConnectivityConfig,
    transport: Arc<dyn Transport>,
    constructions: AtomicU64,
}

impl fmt::Debug for RemoteCoordinatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCoordinatorRegistry")
            .field("stubs", &self.stubs.len())
            .field("constructions", &self.constructions())
            .finish_non_exhaustive()
    }
}

impl RemoteCoordinatorRegistry {
    pub fn new(config: ConnectivityConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            stubs: DashMap::new(),
            config,
            transport,
            constructions: AtomicU64::new(0),
        }
    }

    /// The proxy for `address`, built on first use.
    pub fn get_or_create(&self, address: &RemoteAddress) -> Arc<RemoteCoordinator> {
        if let Some(stub) = self.stubs.get(address.identifier()) {
            return Arc::clone(stub.value());
        }

        let entry = self
            .stubs
            .entry(address.identifier().to_string())
            .or_insert_with(|| {
                self.constructions.fetch_add(1, Ordering::Relaxed);
                let endpoint = self.config.endpoint_for(address);
                tracing::debug!(
                    identifier = address.identifier(),
                    endpoint = %endpoint,
                    "creating remote coordinator"
                );
                Arc::new(RemoteCoordinator::new(
                    address.clone(),
                    endpoint,
                    Arc::clone(&self.transport),
                ))
            });
        Arc::clone(entry.value())
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<RemoteCoordinator>> {
        self.stubs.get(identifier).map(|s| Arc::clone(s.value()))
    }

    /// Drop the proxy for `identifier`; the next lookup builds a new one.
    pub fn evict(&self, identifier: &str) -> Option<Arc<RemoteCoordinator>> {
        self.stubs.remove(identifier).map(|(_, stub)| stub)
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// Number of proxies built since construction.
    pub fn constructions(&self) -> u64 {
        self.constructions.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::testkit::RecordingTransport;

    fn registry() -> RemoteCoordinatorRegistry {
        RemoteCoordinatorRegistry::new(
            ConnectivityConfig::default(),
            Arc::new(RecordingTransport::default()),
        )
    }

    fn addr(s: &str) -> RemoteAddress {
        RemoteAddress::parse(s).unwrap()
    }

    #[test]
    fn same_identifier_same_proxy() {
        let r = registry();
        let a = r.get_or_create(&addr("10.0.0.5:orderservice:8080"));
        let b = r.get_or_create(&addr("10.0.0.5:orderservice:8080"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(r.constructions(), 1);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn distinct_identifiers_distinct_proxies() {
        let r = registry();
        let a = r.get_or_create(&addr("10.0.0.5:orderservice:8080"));
        let b = r.get_or_create(&addr("10.0.0.6:orderservice:8080"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(r.constructions(), 2);
    }

    #[test]
    fn whitespace_variants_are_distinct_keys() {
        let r = registry();
        r.get_or_create(&addr("h:s:1"));
        r.get_or_create(&addr("h : s : 1"));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn concurrent_first_calls_build_one_proxy() {
        const THREADS: usize = 16;
        let r = registry();
        let barrier = Barrier::new(THREADS);
        let address = addr("10.0.0.5:orderservice:8080");

        let proxies: Vec<Arc<RemoteCoordinator>> = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        r.get_or_create(&address)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(r.constructions(), 1);
        assert!(proxies.iter().all(|p| Arc::ptr_eq(p, &proxies[0])));
    }

    #[test]
    fn endpoint_comes_from_config() {
        let mut config = ConnectivityConfig::default();
        config
            .endpoints
            .insert("orderservice".into(), "127.0.0.1:9999".into());
        let r = RemoteCoordinatorRegistry::new(config, Arc::new(RecordingTransport::default()));
        let p = r.get_or_create(&addr("10.0.0.5:orderservice:8080"));
        assert_eq!(p.endpoint().addr(), "127.0.0.1:9999");
    }

    #[test]
    fn evict_forces_rebuild() {
        let r = registry();
        let a = r.get_or_create(&addr("h:s:1"));
        assert!(r.evict("h:s:1").is_some());
        assert!(r.get("h:s:1").is_none());
        let b = r.get_or_create(&addr("h:s:1"));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(r.constructions(), 2);
        assert!(r.evict("unknown:s:1").is_none());
    }
}
