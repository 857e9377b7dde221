//! Symmetric cipher strategies used by the encryption engine.
//!
//! Two constructions sit behind [`PayloadCipher`]:
//!
//! - [`AesGcmCipher`] (default): AES-256-GCM. Confidentiality, integrity and
//!   AAD binding in one primitive; a wrong key or wrong AAD is a clean
//!   authentication failure.
//! - [`KeystreamCipher`]: hash-derived XOR keystream for constrained execution
//!   environments without an AEAD. Blocks are
//!   `SHA256(key || aad || nonce || be32(i))`. There is no tag, so a wrong key
//!   or wrong AAD does not fail here: it yields same-length garbage. Only use
//!   it where the consumer validates the decoded plaintext structure before
//!   acting on it (the scanner requires a well-formed payload naming the
//!   caller's own address).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::envelope::NONCE_LEN;
use crate::error::{DecryptionError, EncryptionError};

/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// A derived 32-byte symmetric key. Zeroized on drop.
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// A symmetric sealing strategy.
pub trait PayloadCipher: Send + Sync {
    /// Stable name, as used in configuration.
    fn kind(&self) -> CipherKind;

    /// Whether a wrong key or AAD is detected by the cipher itself.
    fn is_authenticated(&self) -> bool;

    fn seal(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, EncryptionError>;

    fn open(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        sealed: &[u8],
    ) -> Result<Vec<u8>, DecryptionError>;

    /// Ciphertext length for a plaintext of `plaintext_len` bytes.
    fn sealed_len(&self, plaintext_len: usize) -> usize;
}

// ============================================================================
// AES-256-GCM
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmCipher;

impl PayloadCipher for AesGcmCipher {
    fn kind(&self) -> CipherKind {
        CipherKind::AesGcm
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn seal(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, EncryptionError> {
        let cipher =
            Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| EncryptionError::Cipher)?;
        cipher
            .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|_| EncryptionError::Cipher)
    }

    fn open(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        sealed: &[u8],
    ) -> Result<Vec<u8>, DecryptionError> {
        if sealed.len() < TAG_LEN {
            return Err(DecryptionError);
        }
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| DecryptionError)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: sealed, aad })
            .map_err(|_| DecryptionError)
    }

    fn sealed_len(&self, plaintext_len: usize) -> usize {
        plaintext_len + TAG_LEN
    }
}

// ============================================================================
// Hash keystream
// ============================================================================

#[derive(Debug, Default, Clone, Copy)]
pub struct KeystreamCipher;

impl KeystreamCipher {
    fn apply(key: &SymmetricKey, nonce: &[u8; NONCE_LEN], aad: &[u8], input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len());

        for (block_index, chunk) in input.chunks(32).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(key.as_bytes());
            hasher.update(aad);
            hasher.update(nonce);
            hasher.update((block_index as u32).to_be_bytes());
            let mut mask: [u8; 32] = hasher.finalize().into();

            out.extend(chunk.iter().zip(mask.iter()).map(|(b, m)| b ^ m));
            mask.zeroize();
        }

        out
    }
}

impl PayloadCipher for KeystreamCipher {
    fn kind(&self) -> CipherKind {
        CipherKind::Keystream
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    fn seal(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, EncryptionError> {
        Ok(Self::apply(key, nonce, aad, plaintext))
    }

    fn open(
        &self,
        key: &SymmetricKey,
        nonce: &[u8; NONCE_LEN],
        aad: &[u8],
        sealed: &[u8],
    ) -> Result<Vec<u8>, DecryptionError> {
        Ok(Self::apply(key, nonce, aad, sealed))
    }

    fn sealed_len(&self, plaintext_len: usize) -> usize {
        plaintext_len
    }
}

// ============================================================================
// Configuration selector
// ============================================================================

/// Cipher selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherKind {
    #[default]
    AesGcm,
    Keystream,
}

impl CipherKind {
    pub fn build(self) -> Arc<dyn PayloadCipher> {
        match self {
            CipherKind::AesGcm => Arc::new(AesGcmCipher),
            CipherKind::Keystream => Arc::new(KeystreamCipher),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CipherKind::AesGcm => "aes-gcm",
            CipherKind::Keystream => "keystream",
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-gcm" => Ok(CipherKind::AesGcm),
            "keystream" => Ok(CipherKind::Keystream),
            other => Err(format!("unknown cipher '{}': expected aes-gcm or keystream", other)),
        }
    }
}
