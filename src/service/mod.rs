//! # Connection Services
//!
//! High-level connection management built on the core codec and the
//! protocol layer.
//!
//! ## Components
//! - **Client**: [`NetClient`], the client-side connection manager owning
//!   the stream, session key, and background loops

pub mod client;

pub use client::{decode_message, ConnectionState, NetClient};
