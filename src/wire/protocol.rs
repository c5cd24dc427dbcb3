//! Forwarding protocol message types.
//!
//! A proxy forwards each transactional operation as an `invoke` message
//! naming the target participant; the participant answers with a
//! `reply` carrying the same `id`. All messages are MessagePack maps
//! tagged on `type`.

use serde::{Deserialize, Serialize};

use crate::xa::{Vote, XaError, Xid};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "invoke")]
    Invoke {
        id: u32,
        /// Identifier of the participant, `host:serviceName:port`.
        target: String,
        call: Call,
    },

    #[serde(rename = "reply")]
    Reply {
        id: u32,
        status: Status,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<XaError>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vote: Option<Vote>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        xids: Option<Vec<Xid>>,
    },
}

impl Message {
    /// A successful reply with no payload.
    pub fn ok_reply(id: u32) -> Self {
        Self::Reply {
            id,
            status: Status::Ok,
            error: None,
            vote: None,
            xids: None,
        }
    }

    pub fn error_reply(id: u32, error: XaError) -> Self {
        Self::Reply {
            id,
            status: Status::Error,
            error: Some(error),
            vote: None,
            xids: None,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Self::Invoke { id, .. } | Self::Reply { id, .. } => *id,
        }
    }
}

/// A transactional operation and its arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    Prepare { xid: Xid },
    Commit { xid: Xid, one_phase: bool },
    Rollback { xid: Xid },
    Recover,
    Forget { xid: Xid },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prepare { .. } => "prepare",
            Self::Commit { .. } => "commit",
            Self::Rollback { .. } => "rollback",
            Self::Recover => "recover",
            Self::Forget { .. } => "forget",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Maximum payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;
