//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging, and timing.
//!
//! ## Components
//! - **Crypto**: AES-GCM AEAD encryption of frame payloads
//! - **Logging**: structured logging configuration
//! - **Timeout**: async timeout wrappers and shared duration defaults
//!
//! ## Security
//! - Cryptographically secure RNG for nonces (OS entropy via rand_core)
//! - Memory zeroing for session keys (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod timeout;
