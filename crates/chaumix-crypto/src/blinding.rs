//! # Blinding Operations
//!
//! The requester-side half of the blind-signing protocol.
//!
//! All three public operations share one primitive: multiply the message
//! by a transformed blind factor modulo the key. They differ only in the
//! transformation applied:
//!
//! - [`RsaBlindingKey::blind`] uses `f^e mod n`,
//! - [`RsaBlindingKey::revert_blind`] uses `(f⁻¹)^e mod n` and undoes a
//!   blinding of plain data,
//! - [`RsaBlindingKey::unblind_signature`] uses `f⁻¹ mod n` and undoes
//!   the blinding *through* a signature: the private-exponent operation
//!   turns the `f^e` blinding into a bare `f`, so the plain inverse
//!   recovers a valid signature over the original value. The signer
//!   never sees the blind factor; this is the unlinkability property
//!   the mixing scheme depends on.

use crate::engine::random_below;
use crate::errors::CryptoError;
use crate::keys::RsaBlindingKey;
use num_bigint_dig::{BigUint, ModInverse};
use rsa::traits::PublicKeyParts;

/// Requester-held blind factor, drawn uniformly from `[0, n)`.
///
/// Owned exclusively by the requester and never transmitted.
#[derive(Clone, PartialEq, Eq)]
pub struct BlindFactor(BigUint);

impl BlindFactor {
    /// Sample a fresh factor below the key's modulus by rejection sampling.
    pub fn generate(key: &RsaBlindingKey) -> Self {
        Self(random_below(key.inner().n()))
    }

    /// Rehydrate a factor from its unsigned big-endian representation.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// Unsigned big-endian representation, for requester-side persistence.
    pub fn to_bytes_be(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    fn value(&self) -> &BigUint {
        &self.0
    }

    fn inverse(&self, modulus: &BigUint) -> Result<BigUint, CryptoError> {
        self.0
            .clone()
            .mod_inverse(modulus)
            .and_then(|i| i.to_biguint())
            .ok_or(CryptoError::NonInvertibleBlindFactor)
    }
}

impl std::fmt::Debug for BlindFactor {
    // Factor material stays out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlindFactor(..)")
    }
}

impl RsaBlindingKey {
    /// Blind `data` so the signer cannot link it to the eventual output.
    ///
    /// When no factor is supplied a fresh one is sampled; the caller must
    /// retain the returned factor to unblind later. `data` at or above
    /// the modulus is rejected, never truncated.
    pub fn blind(
        &self,
        data: &BigUint,
        factor: Option<BlindFactor>,
    ) -> Result<(BigUint, BlindFactor), CryptoError> {
        self.check_range(data)?;
        let factor = factor.unwrap_or_else(|| BlindFactor::generate(self));
        let n = self.inner().n();
        let multiplier = factor.value().modpow(self.inner().e(), n);
        Ok((self.apply_multiplier(data, &multiplier), factor))
    }

    /// Undo a [`blind`](Self::blind) of plain data with the same factor.
    pub fn revert_blind(
        &self,
        data: &BigUint,
        factor: &BlindFactor,
    ) -> Result<BigUint, CryptoError> {
        self.check_range(data)?;
        let n = self.inner().n();
        let inverse = factor.inverse(n)?;
        let multiplier = inverse.modpow(self.inner().e(), n);
        Ok(self.apply_multiplier(data, &multiplier))
    }

    /// Unblind a signature produced over blinded data, yielding a valid
    /// signature over the original data.
    pub fn unblind_signature(
        &self,
        signature: &BigUint,
        factor: &BlindFactor,
    ) -> Result<BigUint, CryptoError> {
        self.check_range(signature)?;
        let multiplier = factor.inverse(self.inner().n())?;
        Ok(self.apply_multiplier(signature, &multiplier))
    }

    /// The shared primitive: `msg · multiplier mod n`.
    fn apply_multiplier(&self, msg: &BigUint, multiplier: &BigUint) -> BigUint {
        (msg * multiplier) % self.inner().n()
    }

    fn check_range(&self, value: &BigUint) -> Result<(), CryptoError> {
        if value >= self.inner().n() {
            return Err(CryptoError::InputOutOfRange);
        }
        Ok(())
    }
}
