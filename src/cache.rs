//! Resolution cache: identifier to descriptor, populated once per key.
//!
//! Each key owns a slot behind its own read-write lock. Hits share the
//! read lock. The first caller to miss holds the write lock while the
//! descriptor is built; concurrent callers for the same key wait on it
//! and reuse the result. Failed population leaves nothing behind.
//!
//! Lock order is slot before map shard. Nothing blocks on a slot while
//! holding a shard.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::descriptor::ResourceDescriptor;

type Slot = Arc<RwLock<Option<Arc<ResourceDescriptor>>>>;

#[derive(Debug, Default)]
pub struct ResolutionCache {
    slots: DashMap<String, Slot>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached descriptor for `identifier`. Waits for an in-flight
    /// population of the same key.
    pub fn get(&self, identifier: &str) -> Option<Arc<ResourceDescriptor>> {
        let slot = self.slots.get(identifier).map(|s| Arc::clone(s.value()))?;
        let cached = slot.read().clone();
        cached
    }

    /// Return the cached descriptor, or build, cache and return it.
    ///
    /// `init` runs at most once per call and never concurrently with
    /// another `init` for the same key. Its error is returned as-is and
    /// nothing is cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        identifier: &str,
        init: impl FnOnce() -> Result<ResourceDescriptor, E>,
    ) -> Result<Arc<ResourceDescriptor>, E> {
        loop {
            let slot = self.slot(identifier);
            if let Some(cached) = slot.read().as_ref() {
                tracing::debug!(identifier, "resolution cache hit");
                return Ok(Arc::clone(cached));
            }

            let mut guard = slot.write();
            if let Some(cached) = guard.as_ref() {
                tracing::debug!(identifier, "resolution cache hit after wait");
                return Ok(Arc::clone(cached));
            }

            // Invalidated or abandoned while we waited; start over on
            // whatever slot the map holds now.
            if !self.is_current(identifier, &slot) {
                continue;
            }

            return match init() {
                Ok(descriptor) => {
                    let descriptor = Arc::new(descriptor);
                    *guard = Some(Arc::clone(&descriptor));
                    Ok(descriptor)
                }
                Err(e) => {
                    drop(guard);
                    self.discard_empty(identifier, &slot);
                    Err(e)
                }
            };
        }
    }

    /// Drop the cached descriptor; the next resolution dispatches again.
    pub fn invalidate(&self, identifier: &str) -> Option<Arc<ResourceDescriptor>> {
        let (_, slot) = self.slots.remove(identifier)?;
        let cached = slot.write().take();
        cached
    }

    /// Number of populated entries. Slots still being populated are not
    /// counted.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|e| e.value().try_read().is_some_and(|g| g.is_some()))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, identifier: &str) -> Slot {
        if let Some(slot) = self.slots.get(identifier) {
            return Arc::clone(slot.value());
        }
        let entry = self.slots.entry(identifier.to_string()).or_default();
        Arc::clone(entry.value())
    }

    fn is_current(&self, identifier: &str, slot: &Slot) -> bool {
        self.slots
            .get(identifier)
            .is_some_and(|s| Arc::ptr_eq(s.value(), slot))
    }

    /// Remove an empty slot unless someone else is already using it.
    fn discard_empty(&self, identifier: &str, slot: &Slot) {
        self.slots.remove_if(identifier, |_, s| {
            Arc::ptr_eq(s, slot) && s.try_read().is_some_and(|g| g.is_none())
        });
    }
}
