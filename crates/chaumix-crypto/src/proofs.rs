//! # Audit-Proof Records
//!
//! Immutable carriers for the two key-validity proofs the coordinator
//! publishes alongside its blinding key. The proof *math* (generation
//! and verification) lives outside this crate; only the data shape and
//! the canonical wire encoding are defined here; see [`crate::wire`].

use crate::errors::CryptoError;
use num_bigint_dig::BigUint;

/// Permutation-test proof: an ordered sequence of signature byte strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationTestProof {
    signatures: Vec<Vec<u8>>,
}

impl PermutationTestProof {
    /// Wrap proof signatures. An empty sequence is rejected: on the wire
    /// it would collide with the absence sentinel.
    pub fn new(signatures: Vec<Vec<u8>>) -> Result<Self, CryptoError> {
        if signatures.is_empty() {
            return Err(CryptoError::EmptyProof);
        }
        Ok(Self { signatures })
    }

    /// The proof's signature byte strings, in order.
    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    /// Decoder-internal constructor; the wire layer guarantees non-emptiness.
    pub(crate) fn from_wire(signatures: Vec<Vec<u8>>) -> Self {
        debug_assert!(!signatures.is_empty());
        Self { signatures }
    }
}

/// Poupard–Stern proof: ordered X-values plus one trailing Y-value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoupardSternProof {
    x_values: Vec<BigUint>,
    y_value: BigUint,
}

impl PoupardSternProof {
    /// Wrap proof values. An empty X sequence is rejected: on the wire
    /// it would collide with the absence sentinel.
    pub fn new(x_values: Vec<BigUint>, y_value: BigUint) -> Result<Self, CryptoError> {
        if x_values.is_empty() {
            return Err(CryptoError::EmptyProof);
        }
        Ok(Self { x_values, y_value })
    }

    /// The X-values, in order.
    pub fn x_values(&self) -> &[BigUint] {
        &self.x_values
    }

    /// The trailing Y-value.
    pub fn y_value(&self) -> &BigUint {
        &self.y_value
    }

    /// Decoder-internal constructor; the wire layer guarantees non-emptiness.
    pub(crate) fn from_wire(x_values: Vec<BigUint>, y_value: BigUint) -> Self {
        debug_assert!(!x_values.is_empty());
        Self { x_values, y_value }
    }
}
