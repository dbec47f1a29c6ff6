//! # Symmetric Helper
//!
//! XChaCha20-Poly1305 encryption for coordinator-local secrets.
//!
//! The combined ciphertext carries its nonce as a prefix, so a single
//! opaque blob is enough to decrypt later with only the key.

use crate::errors::CryptoError;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroize;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Nonce width in bytes (XChaCha20 uses a 192-bit nonce).
pub const NONCE_LEN: usize = 24;

/// Encryption nonce.
#[derive(Clone)]
pub struct SymmetricNonce([u8; NONCE_LEN]);

impl SymmetricNonce {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a random nonce (safe with the 192-bit nonce space).
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Inner bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Encrypt under a fresh random nonce; output is `nonce ‖ ciphertext`.
///
/// # Errors
///
/// Returns [`CryptoError::EncryptionFailed`] if encryption fails.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    encrypt_with_nonce(key, &SymmetricNonce::generate(), plaintext)
}

/// Encrypt under an explicit nonce; output is `nonce ‖ ciphertext`.
///
/// # Errors
///
/// Returns [`CryptoError::EncryptionFailed`] if encryption fails.
pub fn encrypt_with_nonce(
    key: &SecretKey,
    nonce: &SymmetricNonce,
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(nonce.as_bytes());
    combined.extend_from_slice(&ciphertext);
    Ok(combined)
}

/// Decrypt a `nonce ‖ ciphertext` blob.
///
/// # Errors
///
/// Returns [`CryptoError::CiphertextTooShort`] when the blob cannot even
/// hold a nonce, [`CryptoError::DecryptionFailed`] on any authentication
/// or decryption failure.
pub fn decrypt(key: &SecretKey, combined: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if combined.len() < NONCE_LEN {
        return Err(CryptoError::CiphertextTooShort {
            expected: NONCE_LEN,
            actual: combined.len(),
        });
    }
    let (nonce, ciphertext) = combined.split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_key_and_nonce_round_trip() {
        let key = SecretKey::from_bytes([b'x'; 32]);
        let nonce = SymmetricNonce::from_bytes([b'a'; 24]);
        let plaintext = b"123123123123123123123123123123";

        let combined = encrypt_with_nonce(&key, &nonce, plaintext).unwrap();
        assert_ne!(&combined[NONCE_LEN..], plaintext.as_slice());

        let decrypted = decrypt(&key, &combined).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_random_nonce_round_trip() {
        let key = SecretKey::generate();
        let combined = encrypt(&key, b"round secret").unwrap();
        assert_eq!(decrypt(&key, &combined).unwrap(), b"round secret");
    }

    #[test]
    fn test_wrong_key_fails() {
        let combined = encrypt(&SecretKey::generate(), b"secret").unwrap();
        assert!(decrypt(&SecretKey::generate(), &combined).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = SecretKey::generate();
        let mut combined = encrypt(&key, b"secret").unwrap();
        let last = combined.len() - 1;
        combined[last] ^= 0xFF;
        assert!(decrypt(&key, &combined).is_err());
    }

    #[test]
    fn test_short_blob_rejected() {
        assert!(matches!(
            decrypt(&SecretKey::generate(), &[0u8; 10]),
            Err(CryptoError::CiphertextTooShort { .. })
        ));
    }
}
