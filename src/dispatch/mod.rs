//! Strategy dispatch: turn a registered service instance into a
//! resource descriptor.
//!
//! Strategies live in an ordered table keyed by capability tag. The
//! first strategy whose capability the instance exposes wins; extending
//! the dispatcher means appending a table entry.

mod probe;
mod strategies;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::descriptor::ResourceDescriptor;
use crate::rm::{Capability, RmError, ServiceInstance};

/// A resource manager failed before a handle could be extracted.
#[derive(Debug, thiserror::Error)]
#[error("{capability}: {stage} failed: {source}")]
pub struct DispatchError {
    pub capability: Capability,
    pub stage: &'static str,
    #[source]
    pub source: RmError,
}

impl DispatchError {
    fn new(capability: Capability, stage: &'static str, source: RmError) -> Self {
        Self {
            capability,
            stage,
            source,
        }
    }
}

type StrategyFn = fn(&str, &ServiceInstance) -> strategies::Outcome;

struct Strategy {
    capability: Capability,
    run: StrategyFn,
}

/// Priority order matters: an instance exposing several capabilities
/// resolves through the earliest one.
const STRATEGIES: &[Strategy] = &[
    Strategy {
        capability: Capability::LocalRecoverable,
        run: strategies::local_recoverable,
    },
    Strategy {
        capability: Capability::Relational,
        run: strategies::relational,
    },
    Strategy {
        capability: Capability::XaRelational,
        run: strategies::xa_relational,
    },
    Strategy {
        capability: Capability::XaMessaging,
        run: strategies::xa_messaging,
    },
    Strategy {
        capability: Capability::XaConnector,
        run: strategies::xa_connector,
    },
];

/// Runs the strategy table and counts invocations.
#[derive(Debug, Default)]
pub struct Dispatcher {
    invocations: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `instance` through the first matching strategy.
    ///
    /// Returns `Ok(None)` when no strategy recognizes the instance.
    /// Validation-probe failures never surface here; they are recorded
    /// on the returned descriptor instead.
    pub fn dispatch(
        &self,
        identifier: &str,
        instance: &ServiceInstance,
    ) -> Result<Option<ResourceDescriptor>, DispatchError> {
        self.invocations.fetch_add(1, Ordering::Relaxed);

        for strategy in STRATEGIES {
            if let Some(outcome) = (strategy.run)(identifier, instance) {
                tracing::debug!(
                    identifier,
                    capability = %strategy.capability,
                    ok = outcome.is_ok(),
                    "strategy matched"
                );
                return outcome.map(Some);
            }
        }

        tracing::debug!(identifier, instance = instance.name(), "no strategy matched");
        Ok(None)
    }

    /// Number of `dispatch` calls since construction.
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}
