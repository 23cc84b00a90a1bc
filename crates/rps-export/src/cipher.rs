//! One-shot AES-256-GCM sealing with a fresh key per document.
//!
//! The ciphertext blob is `nonce (12) || tag (16) || ciphertext`, base64
//! encoded. The key is returned separately and never embedded in the blob.
//! There is no decrypt path here; the recipient decrypts out of band.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{ExportError, ExportResult};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// GCM tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Ciphertext blob plus the key that opens it, both base64.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedDocument {
    /// `nonce || tag || ciphertext`.
    pub content: String,
    /// Raw 256-bit key.
    pub key: String,
}

impl std::fmt::Debug for EncryptedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedDocument")
            .field("content_len", &self.content.len())
            .field("key", &"***")
            .finish()
    }
}

/// Seals documents with a fresh random key and nonce on every call.
#[derive(Debug)]
pub struct DocumentCipher {
    rng: SystemRandom,
}

impl DocumentCipher {
    /// Cipher backed by the system CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }

    /// Encrypt `plaintext` under a newly generated key.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Encrypt`] if the system RNG or the AEAD
    /// primitive fails.
    pub fn encrypt(&self, plaintext: &[u8]) -> ExportResult<EncryptedDocument> {
        let mut key_bytes = [0_u8; KEY_LEN];
        self.rng
            .fill(&mut key_bytes)
            .map_err(|source| ExportError::Encrypt {
                stage: "key",
                source,
            })?;
        let mut nonce_bytes = [0_u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|source| ExportError::Encrypt {
                stage: "nonce",
                source,
            })?;

        let unbound =
            UnboundKey::new(&AES_256_GCM, &key_bytes).map_err(|source| ExportError::Encrypt {
                stage: "key",
                source,
            })?;
        let sealing_key = LessSafeKey::new(unbound);

        let mut ciphertext = plaintext.to_vec();
        let tag = sealing_key
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut ciphertext,
            )
            .map_err(|source| ExportError::Encrypt {
                stage: "seal",
                source,
            })?;

        let mut blob = Vec::with_capacity(NONCE_LEN + TAG_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(tag.as_ref());
        blob.extend_from_slice(&ciphertext);

        Ok(EncryptedDocument {
            content: STANDARD.encode(blob),
            key: STANDARD.encode(key_bytes),
        })
    }
}

impl Default for DocumentCipher {
    fn default() -> Self {
        Self::new()
    }
}
