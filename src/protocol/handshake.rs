//! One-shot elliptic-curve Diffie-Hellman handshake.
//!
//! Immediately after the TCP stream opens, and before any framed traffic,
//! each side writes its ephemeral P-256 public key as 64 raw bytes
//! (big-endian fixed-width X then Y, no SEC1 tag byte) and reads the peer's
//! 64 bytes back. Both sides hash the ECDH shared value with SHA-256 and
//! keep the first 16 bytes as the AES session key.
//!
//! The exchange is strictly sequential with framing: it must complete in
//! full before the packet codec touches the stream.

use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, TransportError};

/// Wire size of an exchanged public key: 32-byte X plus 32-byte Y.
pub const PUBLIC_KEY_SIZE: usize = 64;

/// Size of the derived symmetric session key.
pub const SESSION_KEY_SIZE: usize = 16;

/// SEC1 marker byte for an uncompressed curve point.
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Symmetric session key derived from the handshake.
///
/// Owned exclusively by the connection manager for one session and zeroized
/// on drop; it is never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log key material.
        f.write_str("SessionKey(..)")
    }
}

/// Ephemeral key-exchange state for a single connection attempt.
///
/// Constructing one generates a fresh P-256 key pair; deriving the session
/// key consumes it, so a key pair can never be reused across connections.
pub struct KeyExchange {
    secret: EphemeralSecret,
}

impl KeyExchange {
    /// Generate a fresh ephemeral key pair.
    pub fn new() -> Self {
        Self {
            secret: EphemeralSecret::random(&mut OsRng),
        }
    }

    /// Own public key in wire form: X‖Y affine coordinates, 32 bytes each,
    /// big-endian, without the leading SEC1 format byte.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.secret.public_key().to_encoded_point(false);
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        // Skip the 0x04 uncompressed-point tag.
        bytes.copy_from_slice(&point.as_bytes()[1..]);
        bytes
    }

    /// Derive the 16-byte session key from the peer's wire-form public key.
    ///
    /// # Errors
    /// Returns `TransportError::InvalidPeerKey` if the input is not exactly
    /// 64 bytes or does not decode to a valid P-256 point.
    pub fn compute_shared_secret(self, peer_public_key: &[u8]) -> Result<SessionKey> {
        if peer_public_key.len() != PUBLIC_KEY_SIZE {
            return Err(TransportError::InvalidPeerKey);
        }

        let mut sec1 = [0u8; PUBLIC_KEY_SIZE + 1];
        sec1[0] = UNCOMPRESSED_POINT_TAG;
        sec1[1..].copy_from_slice(peer_public_key);

        let peer_public =
            PublicKey::from_sec1_bytes(&sec1).map_err(|_| TransportError::InvalidPeerKey)?;

        let shared_secret = self.secret.diffie_hellman(&peer_public);

        let digest = Sha256::digest(shared_secret.raw_secret_bytes());
        let mut key = [0u8; SESSION_KEY_SIZE];
        key.copy_from_slice(&digest[..SESSION_KEY_SIZE]);

        Ok(SessionKey(key))
    }

    /// Run the full handshake over `stream`: write our public key, flush,
    /// then read exactly 64 bytes for the peer's key and derive the session
    /// key. The read loops on partial input until 64 bytes are collected.
    ///
    /// # Errors
    /// - `TransportError::ConnectionClosed` if the stream ends before the
    ///   peer key is fully read
    /// - `TransportError::InvalidPeerKey` if the peer bytes are not a curve
    ///   point
    /// - `TransportError::Io` for other stream failures
    pub async fn run<S>(self, stream: &mut S) -> Result<SessionKey>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        stream.write_all(&self.public_key_bytes()).await?;
        stream.flush().await?;

        let mut peer_public_key = [0u8; PUBLIC_KEY_SIZE];
        stream
            .read_exact(&mut peer_public_key)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
                _ => TransportError::Io(e),
            })?;

        self.compute_shared_secret(&peer_public_key)
    }
}

impl Default for KeyExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_is_64_bytes_and_fresh() {
        let a = KeyExchange::new();
        let b = KeyExchange::new();
        assert_eq!(a.public_key_bytes().len(), PUBLIC_KEY_SIZE);
        // Independent ephemeral pairs must differ.
        assert_ne!(a.public_key_bytes(), b.public_key_bytes());
    }

    #[test]
    fn test_both_parties_derive_same_key() {
        let alice = KeyExchange::new();
        let bob = KeyExchange::new();

        let alice_public = alice.public_key_bytes();
        let bob_public = bob.public_key_bytes();

        let alice_key = alice.compute_shared_secret(&bob_public).unwrap();
        let bob_key = bob.compute_shared_secret(&alice_public).unwrap();

        assert_eq!(alice_key.as_bytes(), bob_key.as_bytes());
        assert_eq!(alice_key.as_bytes().len(), SESSION_KEY_SIZE);
    }

    #[test]
    fn test_different_pairs_derive_different_keys() {
        let a1 = KeyExchange::new();
        let b1 = KeyExchange::new();
        let a2 = KeyExchange::new();
        let b2 = KeyExchange::new();

        let b1_public = b1.public_key_bytes();
        let b2_public = b2.public_key_bytes();

        let key1 = a1.compute_shared_secret(&b1_public).unwrap();
        let key2 = a2.compute_shared_secret(&b2_public).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_wrong_length_peer_key_rejected() {
        for len in [0usize, 32, 63, 65] {
            let exchange = KeyExchange::new();
            assert!(matches!(
                exchange.compute_shared_secret(&vec![1u8; len]),
                Err(TransportError::InvalidPeerKey)
            ));
        }
    }

    #[test]
    fn test_off_curve_peer_key_rejected() {
        // (0, 0) does not satisfy the P-256 curve equation.
        let exchange = KeyExchange::new();
        assert!(matches!(
            exchange.compute_shared_secret(&[0u8; PUBLIC_KEY_SIZE]),
            Err(TransportError::InvalidPeerKey)
        ));

        // Coordinates >= the field modulus are rejected at decode.
        let exchange = KeyExchange::new();
        assert!(matches!(
            exchange.compute_shared_secret(&[0xFFu8; PUBLIC_KEY_SIZE]),
            Err(TransportError::InvalidPeerKey)
        ));
    }

    #[tokio::test]
    async fn test_handshake_over_duplex_stream() {
        let (mut client_side, mut server_side) = tokio::io::duplex(256);

        let client = tokio::spawn(async move { KeyExchange::new().run(&mut client_side).await });
        let server = tokio::spawn(async move { KeyExchange::new().run(&mut server_side).await });

        let client_key = client.await.unwrap().unwrap();
        let server_key = server.await.unwrap().unwrap();

        assert_eq!(client_key.as_bytes(), server_key.as_bytes());
    }

    #[tokio::test]
    async fn test_handshake_fails_on_early_eof() {
        let (mut client_side, mut server_side) = tokio::io::duplex(256);

        let client = tokio::spawn(async move { KeyExchange::new().run(&mut client_side).await });

        // Deliver fewer than 64 bytes, then hang up.
        let mut discard = [0u8; PUBLIC_KEY_SIZE];
        server_side.read_exact(&mut discard).await.unwrap();
        server_side.write_all(&[0u8; 10]).await.unwrap();
        drop(server_side);

        assert!(matches!(
            client.await.unwrap(),
            Err(TransportError::ConnectionClosed)
        ));
    }
}
