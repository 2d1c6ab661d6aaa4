//! # Protocol Components
//!
//! Session establishment and message delivery.
//!
//! ## Components
//! - **Handshake**: one-shot P-256 ECDH key exchange run before any framed
//!   traffic
//! - **Dispatcher**: subscriber fan-out for decoded `(proto_id, payload)`
//!   messages and lifecycle events

pub mod dispatcher;
pub mod handshake;

pub use dispatcher::{Dispatcher, TransportEvents};
pub use handshake::{KeyExchange, SessionKey};
