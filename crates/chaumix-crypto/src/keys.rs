//! # RSA Key Material
//!
//! Key generation, the DER key container, and the FDH signature scheme.
//!
//! Keys are generated once at coordinator startup and are immutable for
//! the process lifetime. Generation is a long-running blocking operation
//! (probable-prime search with certainty no weaker than 100 Miller-Rabin
//! rounds); callers on an async runtime must move it off the scheduler.
//!
//! ## Key container
//!
//! Both key kinds use the same outer DER container, a PKCS#8
//! `PrivateKeyInfo` (version 0, rsaEncryption algorithm identifier,
//! octet string payload). The payload is the PKCS#1 `RSAPrivateKey`
//! sequence (version 0, n, e, d, p, q, dP, dQ, qInv) for signing keys
//! and the PKCS#1 `RSAPublicKey` sequence (n, e) for blinding keys.
//! Decoding rejects malformed structure, a wrong algorithm identifier
//! or a bad version tag with [`CryptoError::InvalidKeyFormat`].

use crate::engine::{blinded_private_op, public_op};
use crate::errors::CryptoError;
use crate::fdh::full_domain_hash;
use num_bigint_dig::BigUint;
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::der::asn1::AnyRef;
use rsa::pkcs8::der::{Decode, Encode};
use rsa::pkcs8::{
    AlgorithmIdentifierRef, DecodePrivateKey, EncodePrivateKey, PrivateKeyInfo, Version,
};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

/// RSA modulus size in bits. Candidates failing the bound are rejected
/// and regenerated by the underlying generator.
pub const KEY_SIZE_BITS: usize = 2048;

/// Signature nonce width in bytes (160 bits).
pub const NONCE_BYTES: usize = 20;

/// 160-bit random value bound into every signature's padding.
///
/// Prevents identical-input replay against the signing oracle: two
/// signatures over the same data pad to different values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureNonce([u8; NONCE_BYTES]);

impl SignatureNonce {
    /// Draw a fresh random nonce.
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing nonce bytes.
    pub fn from_bytes(bytes: [u8; NONCE_BYTES]) -> Self {
        Self(bytes)
    }

    /// Raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_BYTES] {
        &self.0
    }
}

fn rsa_algorithm_id() -> AlgorithmIdentifierRef<'static> {
    AlgorithmIdentifierRef {
        oid: rsa::pkcs1::ALGORITHM_OID,
        parameters: Some(AnyRef::NULL),
    }
}

/// Container-level checks shared by both key halves: a version tag other
/// than zero or a non-rsaEncryption algorithm identifier is a format
/// error.
fn check_container(bytes: &[u8]) -> Result<PrivateKeyInfo<'_>, CryptoError> {
    let info = PrivateKeyInfo::from_der(bytes).map_err(|_| CryptoError::InvalidKeyFormat)?;
    if info.version() != Version::V1 || info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(CryptoError::InvalidKeyFormat);
    }
    Ok(info)
}

/// Coordinator signing key (private half).
pub struct RsaSigningKey {
    key: RsaPrivateKey,
    public: RsaBlindingKey,
}

impl RsaSigningKey {
    /// Generate a fresh 2048-bit key pair with e = 65537.
    ///
    /// Blocking and slow; run once at startup, never per signature.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut rng = rand::thread_rng();
        let mut key = RsaPrivateKey::new(&mut rng, KEY_SIZE_BITS)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        key.precompute()
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        Ok(Self::from_private(key))
    }

    /// Decode from the DER key container.
    pub fn from_der(bytes: &[u8]) -> Result<Self, CryptoError> {
        check_container(bytes)?;
        let mut key =
            RsaPrivateKey::from_pkcs8_der(bytes).map_err(|_| CryptoError::InvalidKeyFormat)?;
        key.validate().map_err(|_| CryptoError::InvalidKeyFormat)?;
        key.precompute().map_err(|_| CryptoError::InvalidKeyFormat)?;
        Ok(Self::from_private(key))
    }

    fn from_private(key: RsaPrivateKey) -> Self {
        let public = RsaBlindingKey::from_public(key.to_public_key());
        Self { key, public }
    }

    /// Encode to the DER key container.
    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        let doc = self
            .key
            .to_pkcs8_der()
            .map_err(|_| CryptoError::InvalidKeyFormat)?;
        Ok(doc.as_bytes().to_vec())
    }

    /// The public half of this key.
    pub fn public_key(&self) -> &RsaBlindingKey {
        &self.public
    }

    /// Modulus size in bits.
    pub fn key_size(&self) -> usize {
        self.public.key_size()
    }

    /// Sign `data` under a fresh 160-bit nonce.
    ///
    /// Pads `nonce ‖ data` to the full modulus width with the MGF1-SHA512
    /// full-domain hash, redrawing the nonce until the padded value falls
    /// below the modulus, then applies the blinded private-exponent
    /// operation. Returns the fixed-length signature and the nonce the
    /// verifier must bind.
    pub fn sign(&self, data: &[u8]) -> Result<(Vec<u8>, SignatureNonce), CryptoError> {
        let modulus_len = self.public.modulus_len();
        loop {
            let nonce = SignatureNonce::random();
            let padded = full_domain_hash(nonce.as_bytes(), data, modulus_len);
            let input = BigUint::from_bytes_be(&padded);
            if &input >= self.key.n() {
                tracing::debug!("padded value at or above modulus, redrawing nonce");
                continue;
            }
            let signature = blinded_private_op(&self.key, &input)?;
            return Ok((to_fixed_bytes(&signature, modulus_len), nonce));
        }
    }

    /// Raw private-exponent operation over an already-blinded value.
    ///
    /// This is the coordinator side of the blind-signing protocol: the
    /// requester blinds, the coordinator signs the blinded integer
    /// without learning what it covers, the requester unblinds.
    pub fn sign_blinded(&self, blinded: &BigUint) -> Result<BigUint, CryptoError> {
        blinded_private_op(&self.key, blinded)
    }

    pub(crate) fn inner(&self) -> &RsaPrivateKey {
        &self.key
    }
}

/// Coordinator blinding key (public half).
///
/// Named for its protocol role: requesters use it to blind values and
/// unblind signatures; anyone can use it to verify.
#[derive(Clone, Debug)]
pub struct RsaBlindingKey {
    key: RsaPublicKey,
}

impl RsaBlindingKey {
    pub(crate) fn from_public(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Decode from the DER key container.
    ///
    /// The payload must be a PKCS#1 `RSAPublicKey` sequence; feeding the
    /// private container here is a format error.
    pub fn from_der(bytes: &[u8]) -> Result<Self, CryptoError> {
        let info = check_container(bytes)?;
        let key = RsaPublicKey::from_pkcs1_der(info.private_key)
            .map_err(|_| CryptoError::InvalidKeyFormat)?;
        Ok(Self { key })
    }

    /// Encode to the DER key container (same outer shape as the private
    /// key, PKCS#1 `RSAPublicKey` payload).
    pub fn to_der(&self) -> Result<Vec<u8>, CryptoError> {
        let inner = self
            .key
            .to_pkcs1_der()
            .map_err(|_| CryptoError::InvalidKeyFormat)?;
        let info = PrivateKeyInfo::new(rsa_algorithm_id(), inner.as_bytes());
        info.to_der().map_err(|_| CryptoError::InvalidKeyFormat)
    }

    /// Modulus size in bits.
    pub fn key_size(&self) -> usize {
        self.key.n().bits()
    }

    /// Modulus size in bytes; also the fixed signature length.
    pub fn modulus_len(&self) -> usize {
        (self.key.n().bits() + 7) / 8
    }

    /// Verify a fixed-length FDH signature over `nonce ‖ data`.
    ///
    /// Never errors: any malformed or out-of-range input simply does not
    /// verify.
    pub fn verify(&self, signature: &[u8], data: &[u8], nonce: &SignatureNonce) -> bool {
        let modulus_len = self.modulus_len();
        let padded = full_domain_hash(nonce.as_bytes(), data, modulus_len);
        let expected = BigUint::from_bytes_be(&padded);
        if &expected >= self.key.n() {
            return false;
        }
        if signature.len() > modulus_len {
            return false;
        }
        let signature = BigUint::from_bytes_be(signature);
        if &signature >= self.key.n() {
            return false;
        }
        signature.modpow(self.key.e(), self.key.n()) == expected
    }

    /// Verify an unblinded raw blind signature directly against the
    /// original (never-seen-by-signer) value: `signature^e mod n == data`.
    pub fn verify_unblinded(&self, signature: &BigUint, data: &BigUint) -> bool {
        match public_op(&self.key, signature) {
            Ok(opened) => &opened == data,
            Err(_) => false,
        }
    }

    pub(crate) fn inner(&self) -> &RsaPublicKey {
        &self.key
    }
}

impl PartialEq for RsaBlindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.n() == other.key.n() && self.key.e() == other.key.e()
    }
}

impl Eq for RsaBlindingKey {}

/// Unsigned big-endian encoding left-padded to `len` bytes.
fn to_fixed_bytes(value: &BigUint, len: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    debug_assert!(raw.len() <= len);
    let mut out = vec![0u8; len - raw.len().min(len)];
    out.extend_from_slice(&raw);
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    lazy_static::lazy_static! {
        static ref TEST_KEY: RsaSigningKey = RsaSigningKey::generate().unwrap();
    }

    /// Shared key so the slow 2048-bit generation runs once per test binary.
    pub(crate) fn test_key() -> &'static RsaSigningKey {
        &TEST_KEY
    }

    #[test]
    fn test_generated_key_shape() {
        let key = test_key();
        assert_eq!(key.key_size(), KEY_SIZE_BITS);
        assert_eq!(key.public_key().modulus_len(), KEY_SIZE_BITS / 8);
        assert_eq!(
            key.inner().e(),
            &BigUint::from(65537u32),
            "public exponent is fixed"
        );
    }

    #[test]
    fn test_private_key_round_trip() {
        let key = test_key();
        let decoded = RsaSigningKey::from_der(&key.to_der().unwrap()).unwrap();
        assert_eq!(decoded.to_der().unwrap(), key.to_der().unwrap());
        assert_eq!(decoded.public_key(), key.public_key());

        // Signing behavior is identical across the round trip.
        let (sig, nonce) = decoded.sign(b"round trip").unwrap();
        assert!(key.public_key().verify(&sig, b"round trip", &nonce));
    }

    #[test]
    fn test_public_key_round_trip() {
        let public = test_key().public_key();
        let encoded = public.to_der().unwrap();
        let decoded = RsaBlindingKey::from_der(&encoded).unwrap();
        assert_eq!(&decoded, public);
        assert_eq!(decoded.to_der().unwrap(), encoded);
    }

    #[test]
    fn test_private_container_rejected_as_public_key() {
        // Same outer container, but the payload is the full private
        // sequence, not an RSAPublicKey.
        let private_der = test_key().to_der().unwrap();
        assert!(matches!(
            RsaBlindingKey::from_der(&private_der),
            Err(CryptoError::InvalidKeyFormat)
        ));
    }

    #[test]
    fn test_nonzero_version_tag_rejected() {
        let mut der = test_key().to_der().unwrap();
        // Outer SEQUENCE header (4 bytes for a 2048-bit key), then the
        // version INTEGER 0.
        assert_eq!(&der[4..7], &[0x02, 0x01, 0x00]);
        der[6] = 0x01;
        assert!(matches!(
            RsaSigningKey::from_der(&der),
            Err(CryptoError::InvalidKeyFormat)
        ));
        assert!(matches!(
            RsaBlindingKey::from_der(&der),
            Err(CryptoError::InvalidKeyFormat)
        ));
    }

    #[test]
    fn test_malformed_key_is_format_error() {
        assert!(matches!(
            RsaSigningKey::from_der(&[1u8]),
            Err(CryptoError::InvalidKeyFormat)
        ));
        assert!(matches!(
            RsaBlindingKey::from_der(&[1u8]),
            Err(CryptoError::InvalidKeyFormat)
        ));
    }

    #[test]
    fn test_sign_and_verify_random_messages() {
        let key = test_key();
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let mut data = vec![0u8; 234];
            rng.fill_bytes(&mut data);
            let (sig, nonce) = key.sign(&data).unwrap();
            assert_eq!(sig.len(), key.public_key().modulus_len());
            assert_ne!(&sig[..data.len()], &data[..], "signature is not plaintext");
            assert!(key.public_key().verify(&sig, &data, &nonce));
        }
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let key = test_key();
        let (sig, nonce) = key.sign(b"payload").unwrap();
        let public = key.public_key();

        assert!(public.verify(&sig, b"payload", &nonce));
        assert!(!public.verify(&sig, b"payloae", &nonce));
        assert!(!public.verify(&sig, b"payload", &SignatureNonce::random()));

        let mut flipped = sig.clone();
        flipped[0] ^= 0x01;
        assert!(!public.verify(&flipped, b"payload", &nonce));

        // Overlong signature never verifies, never errors.
        let mut long = sig.clone();
        long.push(0);
        assert!(!public.verify(&long, b"payload", &nonce));
    }

    #[test]
    fn test_fixed_length_padding() {
        assert_eq!(to_fixed_bytes(&BigUint::from(0x01u8), 4), vec![0, 0, 0, 1]);
        assert_eq!(
            to_fixed_bytes(&BigUint::from(0x0102u16), 2),
            vec![0x01, 0x02]
        );
    }
}
