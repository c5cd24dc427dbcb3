//! Length-prefixed MessagePack codec.
//!
//! Each frame is a big-endian `u32` payload length followed by that many
//! bytes of MessagePack.
//!
//! Implements the `tokio_util` codec traits so the same framing serves a
//! `Framed` stream or a blocking socket driving a `BytesMut` by hand.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::protocol::{MAX_PAYLOAD_SIZE, Message};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("frame of {0} bytes exceeds the {MAX_PAYLOAD_SIZE}-byte limit")]
    PayloadTooLarge(usize),
    #[error("socket: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("decode: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

const HEADER_LEN: usize = 4;

/// Stateless frame codec: a frame stays in the buffer, header included,
/// until all of it has arrived.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthPrefixedCodec;

impl LengthPrefixedCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for LengthPrefixedCodec {
    type Item = Message;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&src[..HEADER_LEN]);
        let payload_len = u32::from_be_bytes(header) as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(CodecError::PayloadTooLarge(payload_len));
        }

        let frame_len = HEADER_LEN + payload_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(payload_len);
        Ok(Some(rmp_serde::from_slice(&payload)?))
    }
}

impl Encoder<Message> for LengthPrefixedCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = rmp_serde::to_vec_named(&item)?;
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|&n| n as usize <= MAX_PAYLOAD_SIZE)
            .ok_or(CodecError::PayloadTooLarge(payload.len()))?;

        dst.reserve(HEADER_LEN + payload.len());
        dst.put_u32(len);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}
