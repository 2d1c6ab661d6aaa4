//! # Error Types
//!
//! Comprehensive error handling for the transport core.
//!
//! This module defines all error variants that can occur between the wire and
//! the dispatch boundary, from low-level I/O failures to cryptographic
//! verification errors.
//!
//! ## Error Categories
//! - **I/O Errors**: socket and stream failures
//! - **Framing Errors**: malformed or truncated packets
//! - **Cryptographic Errors**: bad key material, failed authentication
//! - **Lifecycle Errors**: invalid connection-state transitions
//!
//! Codec and cipher errors are returned to the connection manager as typed
//! failures and never panic across component boundaries.

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
/// Static strings are borrowed, avoiding heap allocations for common cases.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCH_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCH_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Connection lifecycle reasons surfaced to subscribers
    pub const REASON_REMOTE_CLOSED: &str = "server closed connection";

    /// Connection state errors
    pub const ERR_STATE_LOCK: &str = "Connection state lock poisoned";
}

/// TransportError is the primary error type for all transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Fewer than 16 bytes were available where a frame header was expected.
    #[error("Malformed frame header")]
    MalformedHeader,

    /// The header promised more payload bytes than the input carried.
    #[error("Truncated payload: header declared {expected} bytes, {actual} available")]
    TruncatedPayload { expected: usize, actual: usize },

    /// A header declared a payload larger than the configured cap.
    #[error("Payload too large: {0} bytes")]
    OversizedPayload(usize),

    /// AES key was not 16, 24, or 32 bytes.
    #[error("Invalid key size: {0} bytes (expected 16, 24, or 32)")]
    InvalidKeySize(usize),

    /// Caller-supplied nonce was not 12 bytes.
    #[error("Invalid nonce size: {0} bytes (expected 12)")]
    InvalidNonceSize(usize),

    /// Peer public key was not 64 bytes or did not decode to a P-256 point.
    #[error("Invalid peer public key")]
    InvalidPeerKey,

    /// AEAD tag verification failed: tampering, corruption, or key mismatch.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Ciphertext envelope shorter than the 12-byte nonce prefix requires.
    #[error("Ciphertext too short")]
    CiphertextTooShort,

    #[error("Encryption failed")]
    EncryptionFailure,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    /// A connect attempt is already in flight; concurrent attempts are
    /// rejected rather than queued.
    #[error("Connect already in progress")]
    ConnectInProgress,

    #[error("Operation timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

/// Type alias for Results using TransportError
pub type Result<T> = std::result::Result<T, TransportError>;
