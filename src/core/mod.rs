//! # Core Wire Components
//!
//! Low-level packet handling and framing.
//!
//! This module is the foundation of the transport: the binary frame format
//! and the tokio codec that moves frames over a byte stream. It holds no
//! connection state and performs no I/O of its own.
//!
//! ## Components
//! - **Packet**: the 16-byte-header frame format shared with the server
//! - **Codec**: tokio codec for framing frames over TCP
//!
//! ## Wire Format
//! ```text
//! [ProtoId(4)] [Version(4)] [DataSize(4)] [IsCompressed(4)] [Payload(N)]
//! ```

pub mod codec;
pub mod packet;
