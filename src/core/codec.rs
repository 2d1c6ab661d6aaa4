//! Tokio codec for framing `Frame`s over a byte stream.
//!
//! Wraps the pure header/payload format in a [`Decoder`]/[`Encoder`] pair so
//! the connection manager can drive a [`tokio_util::codec::Framed`] transport
//! with `SinkExt`/`StreamExt`. Returning `Ok(None)` on partial input makes
//! the framed stream loop on partial reads until a complete frame arrives.
//!
//! ## Security
//! - `data_size` is validated before any allocation
//! - negative lengths are rejected as malformed
//! - payloads above [`MAX_PAYLOAD_SIZE`] are rejected to prevent memory
//!   exhaustion from a hostile or corrupted stream

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::packet::{Frame, HEADER_SIZE};
use crate::error::TransportError;

/// Max allowed payload size (16 MB).
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Length-prefixed frame codec for the 16-byte-header wire format.
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        if src.len() < HEADER_SIZE {
            // Not enough for a header yet; wait for more bytes.
            return Ok(None);
        }

        let header = Frame::decode_header(src)?;

        if header.data_size < 0 {
            return Err(TransportError::MalformedHeader);
        }

        let data_size = header.data_size as usize;
        if data_size > MAX_PAYLOAD_SIZE {
            return Err(TransportError::OversizedPayload(data_size));
        }

        if src.len() < HEADER_SIZE + data_size {
            src.reserve(HEADER_SIZE + data_size - src.len());
            return Ok(None);
        }

        src.advance(HEADER_SIZE);
        let payload = src.split_to(data_size).to_vec();

        Ok(Some(Frame {
            proto_id: header.proto_id,
            version: header.version,
            is_compressed: header.is_compressed,
            payload,
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(HEADER_SIZE + frame.payload.len());
        dst.put_i32_le(frame.proto_id);
        dst.put_i32_le(frame.version);
        dst.put_i32_le(frame.data_size());
        dst.put_i32_le(frame.is_compressed);
        dst.put_slice(&frame.payload);
        Ok(())
    }
}
