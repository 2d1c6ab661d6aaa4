//! # game-transport
//!
//! Secure client-side transport core for real-time game clients.
//!
//! Establishes an encrypted channel over a raw TCP stream and delivers
//! decoded application messages to upper layers in order:
//!
//! 1. **Connect**: open the stream and run a one-shot P-256 ECDH handshake,
//!    deriving a 16-byte AES session key before any framed traffic.
//! 2. **Frame**: every message travels as a 16-byte little-endian header
//!    (`proto_id`, `version`, `data_size`, `is_compressed`) plus payload.
//! 3. **Encrypt**: non-empty payloads are sealed with AES-GCM as
//!    `nonce || ciphertext+tag`, a fresh random nonce per message.
//! 4. **Dispatch**: decrypted `(proto_id, payload)` pairs fan out to
//!    registered subscribers; heartbeats (`proto_id` 0) never surface.
//!
//! Gameplay concerns — object sync, input, UI — live above this crate and
//! see only the [`service::NetClient`] send calls and
//! [`protocol::TransportEvents`] callbacks.
//!
//! ## Example
//! ```no_run
//! use game_transport::config::ClientConfig;
//! use game_transport::protocol::TransportEvents;
//! use game_transport::service::NetClient;
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl TransportEvents for Logger {
//!     fn on_message(&self, proto_id: i32, payload: &[u8]) {
//!         println!("message {proto_id}: {} bytes", payload.len());
//!     }
//! }
//!
//! # async fn run() -> game_transport::error::Result<()> {
//! let client = NetClient::new(ClientConfig::default());
//! client.subscribe(Arc::new(Logger))?;
//! client.connect().await?;
//! client.send(1002, b"alice:secret").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::config::{ClientConfig, TransportConfig};
pub use crate::core::packet::{Frame, HEADER_SIZE, HEARTBEAT_PROTO_ID, PROTOCOL_VERSION};
pub use crate::error::{Result, TransportError};
pub use crate::protocol::{Dispatcher, KeyExchange, SessionKey, TransportEvents};
pub use crate::service::{decode_message, ConnectionState, NetClient};
