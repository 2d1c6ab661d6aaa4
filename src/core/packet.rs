//! Binary frame format for the game wire protocol.
//!
//! ## Wire Format
//! ```text
//! [ProtoId(4)] [Version(4)] [DataSize(4)] [IsCompressed(4)] [Payload(N)]
//! ```
//! All header fields are little-endian `i32`; the header is a fixed 16 bytes
//! and `DataSize` must equal the number of payload bytes that follow.
//!
//! `proto_id` 0 is reserved for heartbeats, `version` is currently always 1,
//! and `is_compressed` is a reserved flag that is always 0. None of the
//! header values are validated here; unknown `proto_id`s are the dispatch
//! layer's concern.

use crate::error::{Result, TransportError};

/// Fixed size of the frame header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Current wire protocol version.
pub const PROTOCOL_VERSION: i32 = 1;

/// Reserved message identifier for keep-alive frames.
pub const HEARTBEAT_PROTO_ID: i32 = 0;

/// One complete wire message: 16-byte header plus payload.
///
/// The payload is opaque at this layer — ciphertext for application
/// messages, empty for heartbeats. `data_size` is derived from the payload
/// rather than stored, so an encoded frame can never lie about its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub proto_id: i32,
    pub version: i32,
    pub is_compressed: i32,
    pub payload: Vec<u8>,
}

/// Decoded frame header, before the payload has been read off the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub proto_id: i32,
    pub version: i32,
    pub data_size: i32,
    pub is_compressed: i32,
}

impl Frame {
    /// Create a frame carrying `payload` under the current protocol version.
    pub fn new(proto_id: i32, payload: Vec<u8>) -> Self {
        Self {
            proto_id,
            version: PROTOCOL_VERSION,
            is_compressed: 0,
            payload,
        }
    }

    /// Create an empty keep-alive frame (`proto_id` 0, no payload).
    pub fn heartbeat() -> Self {
        Self::new(HEARTBEAT_PROTO_ID, Vec::new())
    }

    /// Byte length of the payload, as carried in the `DataSize` header field.
    pub fn data_size(&self) -> i32 {
        self.payload.len() as i32
    }

    /// True for keep-alive frames that must not reach the dispatch layer.
    pub fn is_heartbeat(&self) -> bool {
        self.proto_id == HEARTBEAT_PROTO_ID
    }

    /// Serialize the frame to its wire representation.
    ///
    /// Writes the four header fields in fixed order, then the payload bytes.
    /// Never fails for a well-formed frame.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&self.proto_id.to_le_bytes());
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.data_size().to_le_bytes());
        buf.extend_from_slice(&self.is_compressed.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode just the 16-byte header.
    ///
    /// # Errors
    /// Returns `TransportError::MalformedHeader` if fewer than 16 bytes are
    /// supplied.
    pub fn decode_header(bytes: &[u8]) -> Result<FrameHeader> {
        if bytes.len() < HEADER_SIZE {
            return Err(TransportError::MalformedHeader);
        }

        let read_i32 = |offset: usize| {
            let mut field = [0u8; 4];
            field.copy_from_slice(&bytes[offset..offset + 4]);
            i32::from_le_bytes(field)
        };

        Ok(FrameHeader {
            proto_id: read_i32(0),
            version: read_i32(4),
            data_size: read_i32(8),
            is_compressed: read_i32(12),
        })
    }

    /// Decode a complete frame from a byte slice.
    ///
    /// # Errors
    /// - `TransportError::MalformedHeader` if the input is shorter than 16
    ///   bytes or the header declares a negative payload length.
    /// - `TransportError::TruncatedPayload` if fewer than `data_size` bytes
    ///   follow the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = Self::decode_header(bytes)?;

        if header.data_size < 0 {
            return Err(TransportError::MalformedHeader);
        }

        let expected = header.data_size as usize;
        let actual = bytes.len() - HEADER_SIZE;
        if actual < expected {
            return Err(TransportError::TruncatedPayload { expected, actual });
        }

        Ok(Self {
            proto_id: header.proto_id,
            version: header.version,
            is_compressed: header.is_compressed,
            payload: bytes[HEADER_SIZE..HEADER_SIZE + expected].to_vec(),
        })
    }
}
