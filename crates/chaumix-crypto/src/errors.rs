//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key bytes were not a well-formed DER key container
    #[error("invalid RSA key encoding")]
    InvalidKeyFormat,

    /// Input integer does not fit below the RSA modulus
    #[error("input too large for the RSA modulus")]
    InputOutOfRange,

    /// Blind factor has no inverse modulo the key
    #[error("blind factor is not invertible modulo the key")]
    NonInvertibleBlindFactor,

    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// Symmetric encryption failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Symmetric decryption failed
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Combined ciphertext shorter than the nonce prefix
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Proof record constructed without any elements
    #[error("proof must contain at least one element")]
    EmptyProof,
}
