//! # Full-Domain Hash
//!
//! MGF1 over SHA-512, expanding an arbitrary-length message to the full
//! byte length of the RSA modulus. Required by the signature scheme's
//! security proof: the padded value must range over (nearly) the whole
//! modulus, independent of message length.

use sha2::{Digest, Sha512};

/// MGF1 mask generation (RFC 8017 B.2.1) over SHA-512.
///
/// Concatenates `SHA-512(seed ‖ counter)` for counter = 0, 1, … and
/// truncates to `out_len` bytes.
pub fn mgf1_sha512(seed: &[u8], out_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(out_len.next_multiple_of(Sha512::output_size()));
    let mut counter: u32 = 0;
    while out.len() < out_len {
        let mut hasher = Sha512::new();
        hasher.update(seed);
        hasher.update(counter.to_be_bytes());
        out.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    out.truncate(out_len);
    out
}

/// Full-domain hash of `nonce ‖ data`, `modulus_len` bytes wide.
pub fn full_domain_hash(nonce: &[u8], data: &[u8], modulus_len: usize) -> Vec<u8> {
    let mut msg = Vec::with_capacity(nonce.len() + data.len());
    msg.extend_from_slice(nonce);
    msg.extend_from_slice(data);
    mgf1_sha512(&msg, modulus_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mgf1_length() {
        for len in [0, 1, 63, 64, 65, 256, 1000] {
            assert_eq!(mgf1_sha512(b"seed", len).len(), len);
        }
    }

    #[test]
    fn test_mgf1_deterministic() {
        assert_eq!(mgf1_sha512(b"seed", 256), mgf1_sha512(b"seed", 256));
        assert_ne!(mgf1_sha512(b"seed", 256), mgf1_sha512(b"seeb", 256));
    }

    #[test]
    fn test_mgf1_prefix_property() {
        // Truncating a longer mask yields the shorter mask
        let long = mgf1_sha512(b"abc", 512);
        let short = mgf1_sha512(b"abc", 100);
        assert_eq!(&long[..100], &short[..]);
    }

    #[test]
    fn test_fdh_binds_nonce_and_data() {
        let a = full_domain_hash(&[1u8; 20], b"data", 256);
        let b = full_domain_hash(&[2u8; 20], b"data", 256);
        let c = full_domain_hash(&[1u8; 20], b"atad", 256);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 256);
    }
}
