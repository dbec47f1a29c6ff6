//! # chaumix-crypto: Blind Signature Engine
//!
//! Cryptographic core of the coordinator: RSA blind signatures with
//! full-domain-hash padding, the audit-proof record types with their
//! canonical wire encoding, and a small symmetric helper.
//!
//! ## Components
//!
//! | Module | Contents |
//! |--------|----------|
//! | `keys` | `RsaSigningKey` / `RsaBlindingKey`, DER encoding, sign/verify |
//! | `blinding` | `BlindFactor`, blind / revert-blind |
//! | `fdh` | MGF1-SHA512 full-domain hash |
//! | `proofs` | `PermutationTestProof`, `PoupardSternProof` |
//! | `wire` | canonical length-prefixed binary codec |
//! | `symmetric` | XChaCha20-Poly1305 helper |
//!
//! ## Security Properties
//!
//! - Signatures bind a fresh 160-bit nonce into the padding, so the
//!   signing oracle never signs the same padded value twice.
//! - The private-exponent operation is blinded with a fresh random
//!   factor on every call to resist timing side channels.
//! - Unblinding a signature made over blinded data yields a valid
//!   signature over the original data; the signer never learns the
//!   blind factor. This is the unlinkability the mixer depends on.

pub mod blinding;
pub mod errors;
pub mod fdh;
pub mod keys;
pub mod proofs;
pub mod symmetric;
pub mod wire;

mod engine;

// Re-exports
pub use blinding::BlindFactor;
pub use errors::CryptoError;
pub use keys::{RsaBlindingKey, RsaSigningKey, SignatureNonce, KEY_SIZE_BITS};
pub use proofs::{PermutationTestProof, PoupardSternProof};
pub use symmetric::{SecretKey, SymmetricNonce};
pub use wire::{WireError, WireReader, WireWriter};

/// Arbitrary-precision unsigned integer used throughout the engine.
pub use rsa::BigUint;
