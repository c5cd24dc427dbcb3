//! One-shot CLI commands.
//!
//! The binary has no service registry of its own, so only remote-shaped
//! identifiers resolve; anything else reports not found. Remote
//! participants are reached over TCP with the configured deadlines.

mod format;

use std::sync::Arc;

use xaresolve::remote::RemoteAddress;
use xaresolve::{
    ConnectivityConfig, RemoteCoordinatorRegistry, Resolver, StaticRegistry, TcpTransport,
    recovery,
};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{failed} of {total} identifiers failed")]
    Failures { failed: usize, total: usize },
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn resolver(config: ConnectivityConfig) -> Arc<Resolver> {
    let coordinators = Arc::new(RemoteCoordinatorRegistry::new(
        config,
        Arc::new(TcpTransport::new()),
    ));
    Arc::new(Resolver::new(Arc::new(StaticRegistry::new()), coordinators))
}

/// Print how `identifier` would be classified. Never fails.
pub fn classify(identifier: &str) {
    format::print_classification(identifier, RemoteAddress::parse(identifier));
}

pub async fn resolve(
    config: ConnectivityConfig,
    identifiers: Vec<String>,
) -> Result<(), CommandError> {
    let resolver = resolver(config);
    let total = identifiers.len();

    let results = tokio::task::spawn_blocking(move || {
        identifiers
            .into_iter()
            .map(|id| {
                let result = resolver.resolve(&id);
                (id, result)
            })
            .collect::<Vec<_>>()
    })
    .await?;

    format::print_resolutions(&results);

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        return Err(CommandError::Failures { failed, total });
    }
    Ok(())
}

pub async fn scan(config: ConnectivityConfig, identifiers: Vec<String>) -> Result<(), CommandError> {
    let total = identifiers.len();
    let report = recovery::scan(resolver(config), identifiers).await;
    format::print_scan(&report);

    match report.failures() {
        0 => Ok(()),
        failed => Err(CommandError::Failures { failed, total }),
    }
}
