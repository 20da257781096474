//! Content Encryption Seam
//!
//! At-rest encryption is an external concern: the ordering engine applies
//! the injected [`ContentCipher`] to title, content, and each label on the
//! way in and out of storage, and never orders or compares on ciphertext.
//! Category, color, and rank stay in the clear so partition listings and
//! rank shifts run without decryption.

use async_trait::async_trait;
use thiserror::Error;

/// Failures raised by a cipher implementation
#[derive(Error, Debug)]
pub enum CipherError {
    /// Encryption failed before the value reached storage
    #[error("Encryption failed: {0}")]
    EncryptFailed(String),

    /// Stored ciphertext could not be decrypted
    #[error("Decryption failed: {0}")]
    DecryptFailed(String),
}

/// At-rest encryption for user-authored text fields
///
/// Implementations may derive per-user keys from `owner_id`. Both methods
/// must be deterministic within one call (the engine encrypts immediately
/// before writing and decrypts immediately after reading, never caching
/// either form across requests).
#[async_trait]
pub trait ContentCipher: Send + Sync {
    /// Encrypt one plaintext field for storage
    async fn encrypt(&self, owner_id: &str, plaintext: &str) -> Result<String, CipherError>;

    /// Decrypt one stored field for the caller
    async fn decrypt(&self, owner_id: &str, ciphertext: &str) -> Result<String, CipherError>;
}

/// Identity cipher for deployments that store text in the clear
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCipher;

#[async_trait]
impl ContentCipher for PassthroughCipher {
    async fn encrypt(&self, _owner_id: &str, plaintext: &str) -> Result<String, CipherError> {
        Ok(plaintext.to_string())
    }

    async fn decrypt(&self, _owner_id: &str, ciphertext: &str) -> Result<String, CipherError> {
        Ok(ciphertext.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_passthrough_is_identity() {
        let cipher = PassthroughCipher;

        let sealed = cipher.encrypt("u1", "hello").await.unwrap();
        assert_eq!(sealed, "hello");

        let opened = cipher.decrypt("u1", &sealed).await.unwrap();
        assert_eq!(opened, "hello");
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let cipher: Arc<dyn ContentCipher> = Arc::new(PassthroughCipher);
        assert_eq!(cipher.encrypt("u1", "x").await.unwrap(), "x");
    }
}
