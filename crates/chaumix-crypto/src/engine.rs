//! Raw single-block RSA operations.
//!
//! The private-exponent path is blinded: a fresh random factor is folded
//! into the input and divided back out of the result, so the modular
//! exponentiation never runs directly over attacker-chosen values.

use crate::errors::CryptoError;
use num_bigint_dig::{BigUint, ModInverse, RandBigInt};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Uniform integer in `[0, modulus)` by rejection sampling.
///
/// Draws `modulus`-sized byte strings until one falls below the modulus.
/// The loop is deliberately unbounded; the rejection probability per
/// draw is below 1/2.
pub(crate) fn random_below(modulus: &BigUint) -> BigUint {
    let bits = ((modulus.bits() + 7) / 8) * 8;
    let mut rng = rand::thread_rng();
    loop {
        let candidate = rng.gen_biguint(bits);
        if &candidate < modulus {
            return candidate;
        }
    }
}

/// Public-exponent operation: `input^e mod n`.
///
/// Rejects inputs at or above the modulus; never truncates.
pub(crate) fn public_op(key: &RsaPublicKey, input: &BigUint) -> Result<BigUint, CryptoError> {
    if input >= key.n() {
        return Err(CryptoError::InputOutOfRange);
    }
    Ok(input.modpow(key.e(), key.n()))
}

/// Blinded private-exponent operation: `input^d mod n`.
///
/// Computes `(input · r^e)^d · r⁻¹ mod n` for a fresh invertible `r`,
/// which equals `input^d mod n` while decorrelating the exponentiation
/// from the input.
pub(crate) fn blinded_private_op(
    key: &RsaPrivateKey,
    input: &BigUint,
) -> Result<BigUint, CryptoError> {
    if input >= key.n() {
        return Err(CryptoError::InputOutOfRange);
    }

    let n = key.n();
    let (r, r_inv) = loop {
        let r = random_below(n);
        if r.bits() == 0 {
            continue;
        }
        // Non-invertible r would reveal a factor of n; probability is negligible
        // for a well-formed key, so resample.
        match (&r).mod_inverse(n).and_then(|i| i.to_biguint()) {
            Some(inv) => break (r, inv),
            None => continue,
        }
    };

    let blinded = (input * r.modpow(key.e(), n)) % n;
    let opened = blinded.modpow(key.d(), n);
    Ok((opened * r_inv) % n)
}
