//! AES-GCM authenticated encryption for frame payloads.
//!
//! Payloads travel as `nonce(12) || ciphertext+tag(16)`. A fresh random
//! nonce is generated per encryption call, so the same plaintext never
//! produces the same envelope twice under one session key. Tag verification
//! on decrypt is the sole detection mechanism for tampering, corruption, or
//! key mismatch — a failed tag never yields plaintext.
//!
//! Keys of 16, 24, or 32 bytes select AES-128/192/256; the handshake derives
//! 16-byte session keys, the longer sizes are accepted for parity with the
//! server implementation.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use rand_core::{OsRng, RngCore};

use crate::error::{Result, TransportError};

/// GCM nonce size in bytes, prefixed to every ciphertext envelope.
pub const NONCE_SIZE: usize = 12;

/// AES-192 in GCM mode with the standard 96-bit nonce.
type Aes192Gcm = AesGcm<Aes192, U12>;

/// Generate a fresh random 12-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `plaintext` under `key`, producing `nonce || ciphertext+tag`.
///
/// When `nonce` is `None` a fresh random nonce is generated; a supplied
/// nonce must be exactly 12 bytes. Empty plaintext is valid and yields a
/// minimal authenticated envelope (nonce plus tag only).
///
/// # Errors
/// - `TransportError::InvalidKeySize` unless the key is 16, 24, or 32 bytes
/// - `TransportError::InvalidNonceSize` if a supplied nonce is not 12 bytes
pub fn encrypt(plaintext: &[u8], key: &[u8], nonce: Option<&[u8]>) -> Result<Vec<u8>> {
    let nonce = match nonce {
        Some(supplied) => {
            if supplied.len() != NONCE_SIZE {
                return Err(TransportError::InvalidNonceSize(supplied.len()));
            }
            let mut fixed = [0u8; NONCE_SIZE];
            fixed.copy_from_slice(supplied);
            fixed
        }
        None => generate_nonce(),
    };

    let ciphertext = match key.len() {
        16 => seal::<Aes128Gcm>(key, &nonce, plaintext)?,
        24 => seal::<Aes192Gcm>(key, &nonce, plaintext)?,
        32 => seal::<Aes256Gcm>(key, &nonce, plaintext)?,
        other => return Err(TransportError::InvalidKeySize(other)),
    };

    let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Decrypt a `nonce || ciphertext+tag` envelope produced by [`encrypt`].
///
/// # Errors
/// - `TransportError::InvalidKeySize` unless the key is 16, 24, or 32 bytes
/// - `TransportError::CiphertextTooShort` if the envelope does not extend
///   past the nonce prefix
/// - `TransportError::AuthenticationFailed` if the tag does not verify
pub fn decrypt(envelope: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if !matches!(key.len(), 16 | 24 | 32) {
        return Err(TransportError::InvalidKeySize(key.len()));
    }

    if envelope.len() <= NONCE_SIZE {
        return Err(TransportError::CiphertextTooShort);
    }

    let (nonce, ciphertext) = envelope.split_at(NONCE_SIZE);

    match key.len() {
        16 => open::<Aes128Gcm>(key, nonce, ciphertext),
        24 => open::<Aes192Gcm>(key, nonce, ciphertext),
        _ => open::<Aes256Gcm>(key, nonce, ciphertext),
    }
}

fn seal<C>(key: &[u8], nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: Aead + KeyInit + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| TransportError::InvalidKeySize(key.len()))?;
    cipher
        .encrypt(GenericArray::from_slice(nonce), plaintext)
        .map_err(|_| TransportError::EncryptionFailure)
}

fn open<C>(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: Aead + KeyInit + AeadCore<NonceSize = U12>,
{
    let cipher = C::new_from_slice(key).map_err(|_| TransportError::InvalidKeySize(key.len()))?;
    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| TransportError::AuthenticationFailed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_roundtrip_all_key_sizes() {
        let plaintext = b"alice:secret";
        for key_len in [16usize, 24, 32] {
            let key = vec![0x42u8; key_len];
            let envelope = encrypt(plaintext, &key, None).unwrap();
            assert_eq!(decrypt(&envelope, &key).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let key = [7u8; 16];
        let envelope = encrypt(b"", &key, None).unwrap();
        // Nonce plus the 16-byte tag, nothing else.
        assert_eq!(envelope.len(), NONCE_SIZE + 16);
        assert!(decrypt(&envelope, &key).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_key_size_rejected() {
        assert!(matches!(
            encrypt(b"x", &[0u8; 15], None),
            Err(TransportError::InvalidKeySize(15))
        ));
        assert!(matches!(
            decrypt(&[0u8; 32], &[0u8; 17]),
            Err(TransportError::InvalidKeySize(17))
        ));
    }

    #[test]
    fn test_invalid_nonce_size_rejected() {
        let key = [0u8; 16];
        assert!(matches!(
            encrypt(b"x", &key, Some(&[0u8; 11])),
            Err(TransportError::InvalidNonceSize(11))
        ));
        assert!(matches!(
            encrypt(b"x", &key, Some(&[0u8; 13])),
            Err(TransportError::InvalidNonceSize(13))
        ));
    }

    #[test]
    fn test_supplied_nonce_is_used() {
        let key = [1u8; 16];
        let nonce = [9u8; NONCE_SIZE];
        let envelope = encrypt(b"payload", &key, Some(&nonce)).unwrap();
        assert_eq!(&envelope[..NONCE_SIZE], &nonce);
        assert_eq!(decrypt(&envelope, &key).unwrap(), b"payload");
    }

    #[test]
    fn test_envelope_too_short() {
        let key = [0u8; 16];
        assert!(matches!(
            decrypt(&[0u8; NONCE_SIZE], &key),
            Err(TransportError::CiphertextTooShort)
        ));
        assert!(matches!(
            decrypt(&[], &key),
            Err(TransportError::CiphertextTooShort)
        ));
    }

    #[test]
    fn test_any_bit_flip_fails_authentication() {
        let key = [3u8; 16];
        let envelope = encrypt(b"integrity", &key, None).unwrap();

        for i in 0..envelope.len() {
            let mut tampered = envelope.clone();
            tampered[i] ^= 0x01;
            assert!(
                matches!(
                    decrypt(&tampered, &key),
                    Err(TransportError::AuthenticationFailed)
                ),
                "flip at byte {i} was not detected"
            );
        }
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let envelope = encrypt(b"secret", &[1u8; 16], None).unwrap();
        assert!(matches!(
            decrypt(&envelope, &[2u8; 16]),
            Err(TransportError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_nonces_unique_across_many_calls() {
        let key = [5u8; 16];
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let envelope = encrypt(b"ping", &key, None).unwrap();
            let nonce: [u8; NONCE_SIZE] = envelope[..NONCE_SIZE].try_into().unwrap();
            assert!(seen.insert(nonce), "nonce reused under the same key");
        }
    }
}
