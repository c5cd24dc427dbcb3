//! Forwarding proxy for a remote participant.
//!
//! The proxy holds no transactional state: each [`XaResource`] method is
//! a stub that packs its arguments into a [`Call`] and forwards it
//! through [`RemoteCoordinator::invoke`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use super::{Endpoint, RemoteAddress, Transport};
use crate::wire::protocol::{Call, Message, Status};
use crate::xa::{Vote, XaError, XaResource, Xid};

/// Payload of a successful reply.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reply {
    pub vote: Option<Vote>,
    pub xids: Option<Vec<Xid>>,
}

pub struct RemoteCoordinator {
    address: RemoteAddress,
    endpoint: Endpoint,
    transport: Arc<dyn Transport>,
    next_id: AtomicU32,
}

impl fmt::Debug for RemoteCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCoordinator")
            .field("identifier", &self.address.identifier())
            .field("endpoint", &self.endpoint.addr())
            .finish_non_exhaustive()
    }
}

impl RemoteCoordinator {
    pub fn new(address: RemoteAddress, endpoint: Endpoint, transport: Arc<dyn Transport>) -> Self {
        Self {
            address,
            endpoint,
            transport,
            next_id: AtomicU32::new(1),
        }
    }

    pub fn identifier(&self) -> &str {
        self.address.identifier()
    }

    pub fn address(&self) -> &RemoteAddress {
        &self.address
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Forward one operation to the participant and wait for its reply.
    pub fn invoke(&self, call: Call) -> Result<Reply, XaError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let op = call.name();
        let request = Message::Invoke {
            id,
            target: self.identifier().to_string(),
            call,
        };

        tracing::trace!(identifier = self.identifier(), op, id, "forwarding call");

        let response = self.transport.exchange(&self.endpoint, request).map_err(|e| {
            tracing::warn!(
                identifier = self.identifier(),
                endpoint = %self.endpoint,
                op,
                error = %e,
                "forwarding failed"
            );
            XaError::Unreachable(format!("{}: {e}", self.endpoint))
        })?;

        match response {
            Message::Reply { id: reply_id, .. } if reply_id != id => Err(XaError::Protocol(
                format!("{op}: reply id {reply_id} does not match request id {id}"),
            )),
            Message::Reply {
                status: Status::Ok,
                vote,
                xids,
                ..
            } => Ok(Reply { vote, xids }),
            Message::Reply {
                status: Status::Error,
                error,
                ..
            } => Err(error.unwrap_or_else(|| {
                XaError::Protocol(format!("{op}: error reply without detail"))
            })),
            other => Err(XaError::Protocol(format!(
                "{op}: unexpected response {other:?}"
            ))),
        }
    }
}

impl XaResource for RemoteCoordinator {
    fn prepare(&self, xid: &Xid) -> Result<Vote, XaError> {
        self.invoke(Call::Prepare { xid: xid.clone() })?
            .vote
            .ok_or_else(|| XaError::Protocol("prepare: reply without vote".into()))
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> Result<(), XaError> {
        self.invoke(Call::Commit {
            xid: xid.clone(),
            one_phase,
        })?;
        Ok(())
    }

    fn rollback(&self, xid: &Xid) -> Result<(), XaError> {
        self.invoke(Call::Rollback { xid: xid.clone() })?;
        Ok(())
    }

    fn recover(&self) -> Result<Vec<Xid>, XaError> {
        Ok(self.invoke(Call::Recover)?.xids.unwrap_or_default())
    }

    fn forget(&self, xid: &Xid) -> Result<(), XaError> {
        self.invoke(Call::Forget { xid: xid.clone() })?;
        Ok(())
    }
}
