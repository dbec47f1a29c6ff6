//! Signing-key persistence.
//!
//! The coordinator's RSA key lives in a single DER file next to the
//! config. Missing file means first start: generate a fresh key and
//! write it out. Generation takes seconds, so it runs on the blocking
//! pool.

use anyhow::{Context, Result};
use chaumix_crypto::RsaSigningKey;
use std::path::Path;
use tracing::info;

/// Load the signing key from `path`, generating and persisting one when
/// the file does not exist yet.
pub async fn load_or_generate(path: &Path) -> Result<RsaSigningKey> {
    if path.exists() {
        let der = std::fs::read(path)
            .with_context(|| format!("reading signing key {}", path.display()))?;
        let key = RsaSigningKey::from_der(&der)
            .with_context(|| format!("decoding signing key {}", path.display()))?;
        info!(path = %path.display(), "loaded signing key");
        return Ok(key);
    }

    info!(path = %path.display(), "no signing key found, generating (this takes a moment)");
    let key = tokio::task::spawn_blocking(RsaSigningKey::generate)
        .await
        .context("key generation task panicked")?
        .context("generating signing key")?;

    let der = key.to_der().context("encoding signing key")?;
    std::fs::write(path, der.as_slice())
        .with_context(|| format!("writing signing key {}", path.display()))?;
    info!(path = %path.display(), "generated and stored signing key");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_then_reload_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RsaKey.der");

        let generated = load_or_generate(&path).await.unwrap();
        assert!(path.exists());

        let reloaded = load_or_generate(&path).await.unwrap();
        assert_eq!(generated.public_key(), reloaded.public_key());
    }
}
