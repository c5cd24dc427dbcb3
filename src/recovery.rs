//! Recovery scan.
//!
//! After a restart the transaction manager re-resolves every identifier
//! in its log and asks each participant for its in-doubt branches. The
//! scan only reports; commit or rollback decisions belong to the caller.
//!
//! Resolution and `recover` block, so each identifier runs on the tokio
//! blocking pool. Identifiers are independent: one unreachable
//! participant never holds up or fails the others.

use std::sync::Arc;

use crate::descriptor::{DescriptorKind, ProbeFailure};
use crate::resolver::{ResolveError, Resolver};
use crate::xa::{XaError, Xid};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{identifier}: recover failed: {source}")]
    Recover { identifier: String, source: XaError },

    #[error("{identifier}: scan task failed: {reason}")]
    Task { identifier: String, reason: String },
}

/// What one resolved participant reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFinding {
    pub kind: DescriptorKind,
    pub in_doubt: Vec<Xid>,
    pub degraded: Option<ProbeFailure>,
}

#[derive(Debug)]
pub struct ScanEntry {
    pub identifier: String,
    pub outcome: Result<ScanFinding, ScanError>,
}

/// Per-identifier results, in request order.
#[derive(Debug)]
pub struct ScanReport {
    pub scan_id: String,
    pub entries: Vec<ScanEntry>,
}

impl ScanReport {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }

    /// Total in-doubt branches across all participants.
    pub fn in_doubt(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok())
            .map(|f| f.in_doubt.len())
            .sum()
    }
}

/// Resolve every identifier and collect its in-doubt branches.
pub async fn scan(resolver: Arc<Resolver>, identifiers: Vec<String>) -> ScanReport {
    let scan_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(scan = %scan_id, identifiers = identifiers.len(), "recovery scan started");

    let tasks = identifiers.into_iter().map(|identifier| {
        let resolver = Arc::clone(&resolver);
        async move {
            let id = identifier.clone();
            let outcome = tokio::task::spawn_blocking(move || scan_one(&resolver, &id))
                .await
                .unwrap_or_else(|e| {
                    Err(ScanError::Task {
                        identifier: identifier.clone(),
                        reason: e.to_string(),
                    })
                });
            ScanEntry {
                identifier,
                outcome,
            }
        }
    });
    let entries = futures::future::join_all(tasks).await;

    let report = ScanReport { scan_id, entries };
    tracing::info!(
        scan = %report.scan_id,
        in_doubt = report.in_doubt(),
        failures = report.failures(),
        "recovery scan finished"
    );
    report
}

fn scan_one(resolver: &Resolver, identifier: &str) -> Result<ScanFinding, ScanError> {
    let descriptor = resolver.resolve(identifier)?;
    let in_doubt = descriptor.xa_resource().recover().map_err(|source| {
        tracing::warn!(identifier, error = %source, "recover failed");
        ScanError::Recover {
            identifier: identifier.to_string(),
            source,
        }
    })?;

    if !in_doubt.is_empty() {
        tracing::info!(identifier, branches = in_doubt.len(), "in-doubt branches found");
    }
    Ok(ScanFinding {
        kind: descriptor.kind(),
        in_doubt,
        degraded: descriptor.degraded().cloned(),
    })
}
