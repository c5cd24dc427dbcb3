//! Recovery shim for plain relational resource managers.
//!
//! A non-XA store joins a global transaction as a local transaction that
//! also writes a branch record. The record exists iff the local work
//! committed, so recovery can reconstruct the branch outcome from it.

use std::sync::Arc;

use super::{Closeable, Connection, DataSource, RmError};
use crate::xa::{Vote, XaError, XaResource, Xid};

#[derive(Debug, Clone)]
pub struct RecoveredResource {
    data_source: Arc<dyn DataSource>,
}

impl RecoveredResource {
    pub fn new(data_source: Arc<dyn DataSource>) -> Self {
        Self { data_source }
    }

    pub fn data_source(&self) -> &Arc<dyn DataSource> {
        &self.data_source
    }

    /// Run `f` on a fresh connection, closing it on every path.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut dyn Connection) -> Result<T, RmError>,
    ) -> Result<T, XaError> {
        let mut conn = self.data_source.connection().map_err(rm_failure)?;
        let result = f(conn.as_mut());
        if let Err(e) = conn.close() {
            tracing::debug!(error = %e, "recovered resource: close failed");
        }
        result.map_err(rm_failure)
    }
}

fn rm_failure(e: RmError) -> XaError {
    XaError::ResourceManager(e.0)
}

impl XaResource for RecoveredResource {
    /// Local work is already settled by the time the branch is recovered.
    fn prepare(&self, _xid: &Xid) -> Result<Vote, XaError> {
        Ok(Vote::ReadOnly)
    }

    fn commit(&self, xid: &Xid, _one_phase: bool) -> Result<(), XaError> {
        self.with_connection(|c| c.forget_branch(xid))?;
        Ok(())
    }

    fn rollback(&self, xid: &Xid) -> Result<(), XaError> {
        let recorded = self.with_connection(|c| {
            let branches = c.recorded_branches()?;
            Ok(branches.contains(xid))
        })?;
        if recorded {
            return Err(XaError::HeuristicCommit);
        }
        Ok(())
    }

    fn recover(&self) -> Result<Vec<Xid>, XaError> {
        self.with_connection(|c| c.recorded_branches())
    }

    fn forget(&self, xid: &Xid) -> Result<(), XaError> {
        self.with_connection(|c| c.forget_branch(xid))?;
        Ok(())
    }
}
