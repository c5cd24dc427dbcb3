//! Transport collaborator for forwarding proxies.
//!
//! The proxy only needs request/response exchange with an endpoint.
//! [`TcpTransport`] is the stock implementation: blocking, one
//! connection per exchange, length-prefixed MessagePack framing.
//! Deadlines come from the endpoint; this layer adds none of its own.

use std::fmt;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::Endpoint;
use crate::wire::codec::{CodecError, LengthPrefixedCodec};
use crate::wire::protocol::Message;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot resolve {0}")]
    Resolve(String),
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("connection closed before reply")]
    Closed,
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// Request/response exchange with a remote participant.
///
/// `Send + Sync` because one proxy is shared by every thread that
/// resolves its identifier.
pub trait Transport: Send + Sync + fmt::Debug {
    fn exchange(&self, endpoint: &Endpoint, request: Message) -> Result<Message, TransportError>;
}

const READ_CHUNK: usize = 8 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }

    fn connect(endpoint: &Endpoint) -> Result<TcpStream, TransportError> {
        let mut last_err = None;
        let addrs = endpoint
            .addr()
            .to_socket_addrs()
            .map_err(|_| TransportError::Resolve(endpoint.addr().to_string()))?;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, endpoint.connect_timeout()) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        match last_err {
            Some(source) => Err(TransportError::Connect {
                endpoint: endpoint.addr().to_string(),
                source,
            }),
            None => Err(TransportError::Resolve(endpoint.addr().to_string())),
        }
    }
}

impl Transport for TcpTransport {
    fn exchange(&self, endpoint: &Endpoint, request: Message) -> Result<Message, TransportError> {
        let mut stream = Self::connect(endpoint)?;
        stream.set_read_timeout(Some(endpoint.io_timeout()))?;
        stream.set_write_timeout(Some(endpoint.io_timeout()))?;
        stream.set_nodelay(true)?;

        let mut codec = LengthPrefixedCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(request, &mut buf)?;
        stream.write_all(&buf)?;
        stream.flush()?;

        buf.clear();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(response) = codec.decode(&mut buf)? {
                return match response {
                    Message::Reply { .. } => Ok(response),
                    Message::Invoke { id, .. } => Err(TransportError::UnexpectedReply(format!(
                        "invoke {id} where a reply was expected"
                    ))),
                };
            }
            let n = stream.read(&mut chunk)?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}
