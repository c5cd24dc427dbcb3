//! Transactional capability: the two-phase-commit primitives a resource
//! manager (or a remote participant) exposes to the transaction manager.
//!
//! Every resolved descriptor carries exactly one [`XaResource`]. Local
//! resource managers hand out their native implementation; remote
//! participants are reached through a forwarding proxy that implements
//! the same trait.

mod xid;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use xid::Xid;

/// Outcome of a successful prepare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    /// Branch is prepared and awaits commit or rollback.
    Ok,
    /// Branch made no changes; it takes no part in the second phase.
    ReadOnly,
}

/// Failures reported by a transactional resource.
///
/// Serializable so a remote participant can report the same failure
/// shape over the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum XaError {
    /// Resource manager failed (connection lost, internal error).
    #[error("resource manager error: {0}")]
    ResourceManager(String),

    /// The resource manager has no record of the branch.
    #[error("unknown transaction branch")]
    UnknownBranch,

    #[error("branch was heuristically committed")]
    HeuristicCommit,

    #[error("branch was heuristically rolled back")]
    HeuristicRollback,

    #[error("branch was partly committed and partly rolled back")]
    HeuristicMixed,

    /// Prepare refused; the branch has been rolled back.
    #[error("branch rolled back")]
    RolledBack,

    /// Operation invoked out of protocol order, or a malformed exchange.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Remote participant could not be reached.
    #[error("participant unreachable: {0}")]
    Unreachable(String),
}

/// Two-phase-commit primitives for one resource manager.
///
/// `Send + Sync` is required because the transaction manager drives
/// branches from a worker pool and the recovery sweep.
pub trait XaResource: Send + Sync + fmt::Debug {
    fn prepare(&self, xid: &Xid) -> Result<Vote, XaError>;

    fn commit(&self, xid: &Xid, one_phase: bool) -> Result<(), XaError>;

    fn rollback(&self, xid: &Xid) -> Result<(), XaError>;

    /// List branches the resource manager holds in a prepared or
    /// heuristically completed state.
    fn recover(&self) -> Result<Vec<Xid>, XaError>;

    /// Discard knowledge of a heuristically completed branch.
    fn forget(&self, xid: &Xid) -> Result<(), XaError>;
}
