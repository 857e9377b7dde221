//! Sender-side sealing and recipient-side opening.
//!
//! ## Protocol
//!
//! ### Seal (sender)
//! 1. Fresh ephemeral key pair (r, R = r·G) per call
//! 2. Shared point: ss = r·P, P the recipient public key
//! 3. key = SHA256("stealth-deposit/kdf/v1" || R || P || ss)
//! 4. Fresh random nonce; seal plaintext under (key, nonce, aad)
//!
//! ### Open (recipient)
//! 1. ss = p·R (same point as the sender's r·P)
//! 2. Same key derivation
//! 3. Open under (key, nonce, aad); any failure is a plain `DecryptionError`
//!
//! The engine is stateless apart from the selected cipher and is safe to share
//! across threads.

use std::sync::Arc;

use rand::{rngs::OsRng, CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::aad::Aad;
use crate::cipher::{CipherKind, PayloadCipher, SymmetricKey};
use crate::envelope::{EnvelopeBundle, NONCE_LEN};
use crate::error::{DecryptionError, EncryptionError, Result};
use crate::keys::{KeyPair, PrivateKey, PublicKey, PUBLIC_KEY_LEN};

/// Largest plaintext the engine will seal.
pub const MAX_PLAINTEXT_LEN: usize = 128;

/// Domain separator between the raw ECDH output and the symmetric key
const KDF_DOMAIN: &[u8] = b"stealth-deposit/kdf/v1";

/// Output of [`EncryptionEngine::seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub ephemeral_pubkey: [u8; PUBLIC_KEY_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext, including the tag when the cipher has one.
    pub sealed: Vec<u8>,
}

#[derive(Clone)]
pub struct EncryptionEngine {
    cipher: Arc<dyn PayloadCipher>,
}

impl EncryptionEngine {
    pub fn new(kind: CipherKind) -> Self {
        Self::with_cipher(kind.build())
    }

    pub fn with_cipher(cipher: Arc<dyn PayloadCipher>) -> Self {
        Self { cipher }
    }

    pub fn cipher_kind(&self) -> CipherKind {
        self.cipher.kind()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cipher.is_authenticated()
    }

    /// Seal `plaintext` to `recipient` under `aad`.
    ///
    /// Oversized plaintexts are rejected before any key material is drawn.
    pub fn seal(&self, recipient: &PublicKey, plaintext: &[u8], aad: &[u8]) -> Result<SealedPayload> {
        self.seal_with(&mut OsRng, recipient, plaintext, aad)
    }

    /// [`seal`](Self::seal) drawing the ephemeral key and nonce from `rng`.
    pub fn seal_with<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        recipient: &PublicKey,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<SealedPayload> {
        if plaintext.len() > MAX_PLAINTEXT_LEN {
            return Err(EncryptionError::PlaintextTooLarge {
                actual: plaintext.len(),
                max: MAX_PLAINTEXT_LEN,
            }
            .into());
        }

        let ephemeral = KeyPair::generate_with(rng)?;
        let ephemeral_pubkey = ephemeral.public_key().to_bytes();

        let key = derive_key(
            ephemeral.private_key(),
            recipient,
            &ephemeral_pubkey,
            recipient.as_bytes(),
        );

        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let sealed = self.cipher.seal(&key, &nonce, aad, plaintext)?;

        Ok(SealedPayload {
            ephemeral_pubkey,
            nonce,
            sealed,
        })
    }

    /// Open a sealed payload with the recipient's private key.
    ///
    /// A total function: every failure (malformed ephemeral key, wrong key,
    /// wrong AAD, tampered ciphertext) is the same `DecryptionError`.
    pub fn open(
        &self,
        private_key: &PrivateKey,
        ephemeral_pubkey: &[u8],
        nonce: &[u8; NONCE_LEN],
        sealed: &[u8],
        aad: &[u8],
    ) -> std::result::Result<Vec<u8>, DecryptionError> {
        let recipient = private_key.public_key();
        self.open_as(private_key, &recipient, ephemeral_pubkey, nonce, sealed, aad)
    }

    /// Same as [`open`](Self::open) with the recipient public key supplied,
    /// which saves one base-point multiplication per attempt while scanning.
    pub fn open_as(
        &self,
        private_key: &PrivateKey,
        recipient: &PublicKey,
        ephemeral_pubkey: &[u8],
        nonce: &[u8; NONCE_LEN],
        sealed: &[u8],
        aad: &[u8],
    ) -> std::result::Result<Vec<u8>, DecryptionError> {
        let ephemeral = PublicKey::from_bytes(ephemeral_pubkey).map_err(|_| DecryptionError)?;

        let key = derive_key(
            private_key,
            &ephemeral,
            ephemeral.as_bytes(),
            recipient.as_bytes(),
        );

        self.cipher.open(&key, nonce, aad, sealed)
    }

    /// Seal and bundle in one step; the deposit id is taken from the AAD.
    pub fn seal_envelope(
        &self,
        recipient: &PublicKey,
        plaintext: &[u8],
        aad: &Aad,
    ) -> Result<EnvelopeBundle> {
        let sealed = self.seal(recipient, plaintext, aad.as_bytes())?;
        Ok(EnvelopeBundle {
            deposit_id: aad.deposit_id(),
            ephemeral_pubkey: sealed.ephemeral_pubkey,
            nonce: sealed.nonce,
            sealed: sealed.sealed,
        })
    }

    pub fn open_envelope(
        &self,
        keys: &KeyPair,
        envelope: &EnvelopeBundle,
        aad: &Aad,
    ) -> std::result::Result<Vec<u8>, DecryptionError> {
        self.open_as(
            keys.private_key(),
            keys.public_key(),
            &envelope.ephemeral_pubkey,
            &envelope.nonce,
            &envelope.sealed,
            aad.as_bytes(),
        )
    }
}

impl Default for EncryptionEngine {
    fn default() -> Self {
        Self::new(CipherKind::default())
    }
}

impl std::fmt::Debug for EncryptionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionEngine")
            .field("cipher", &self.cipher.kind())
            .finish()
    }
}

/// ECDH followed by a domain-separated hash.
///
/// `own` is the local private scalar and `peer` the other party's point; both
/// sides feed the same (ephemeral, recipient) pair into the hash.
fn derive_key(
    own: &PrivateKey,
    peer: &PublicKey,
    ephemeral_pubkey: &[u8; PUBLIC_KEY_LEN],
    recipient_pubkey: &[u8; PUBLIC_KEY_LEN],
) -> SymmetricKey {
    let mut shared = (&own.to_scalar() * peer.point()).compress().to_bytes();

    let mut hasher = Sha256::new();
    hasher.update(KDF_DOMAIN);
    hasher.update(ephemeral_pubkey);
    hasher.update(recipient_pubkey);
    hasher.update(shared);
    shared.zeroize();

    SymmetricKey::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepositError;

    #[test]
    fn test_seal_open_roundtrip() {
        let engine = EncryptionEngine::default();
        let keys = KeyPair::generate().unwrap();

        let sealed = engine.seal(keys.public_key(), b"payload", b"aad").unwrap();
        assert_eq!(sealed.sealed.len(), 7 + 16);

        let opened = engine
            .open(keys.private_key(), &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed, b"aad")
            .unwrap();
        assert_eq!(opened, b"payload");
    }

    #[test]
    fn test_empty_plaintext_roundtrips() {
        let keys = KeyPair::generate().unwrap();

        for kind in [CipherKind::AesGcm, CipherKind::Keystream] {
            let engine = EncryptionEngine::new(kind);
            let sealed = engine.seal(keys.public_key(), b"", b"aad").unwrap();

            let opened = engine
                .open(keys.private_key(), &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed, b"aad")
                .unwrap();
            assert!(opened.is_empty(), "cipher {}", kind);
        }
    }

    #[test]
    fn test_authentication_follows_cipher() {
        assert!(EncryptionEngine::default().is_authenticated());
        assert!(EncryptionEngine::new(CipherKind::AesGcm).is_authenticated());
        assert!(!EncryptionEngine::new(CipherKind::Keystream).is_authenticated());
    }

    #[test]
    fn test_fresh_ephemeral_and_nonce_per_call() {
        let engine = EncryptionEngine::default();
        let keys = KeyPair::generate().unwrap();

        let a = engine.seal(keys.public_key(), b"same", b"aad").unwrap();
        let b = engine.seal(keys.public_key(), b"same", b"aad").unwrap();

        assert_ne!(a.ephemeral_pubkey, b.ephemeral_pubkey);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.sealed, b.sealed);
    }

    #[test]
    fn test_oversized_plaintext_rejected() {
        let engine = EncryptionEngine::default();
        let keys = KeyPair::generate().unwrap();

        let err = engine
            .seal(keys.public_key(), &[0u8; MAX_PLAINTEXT_LEN + 1], b"aad")
            .unwrap_err();
        assert!(matches!(
            err,
            DepositError::Encryption(EncryptionError::PlaintextTooLarge { actual: 129, max: 128 })
        ));

        assert!(engine.seal(keys.public_key(), &[0u8; MAX_PLAINTEXT_LEN], b"aad").is_ok());
    }

    #[test]
    fn test_wrong_key_and_wrong_aad_fail() {
        let engine = EncryptionEngine::default();
        let keys = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();

        let sealed = engine.seal(keys.public_key(), b"payload", b"aad").unwrap();

        assert_eq!(
            engine.open(other.private_key(), &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed, b"aad"),
            Err(DecryptionError)
        );
        assert_eq!(
            engine.open(keys.private_key(), &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed, b"aae"),
            Err(DecryptionError)
        );
    }

    #[test]
    fn test_malformed_ephemeral_key_fails_quietly() {
        let engine = EncryptionEngine::default();
        let keys = KeyPair::generate().unwrap();
        let sealed = engine.seal(keys.public_key(), b"payload", b"aad").unwrap();

        let mut identity = [0u8; 32];
        identity[0] = 1;

        for bad in [&identity[..], &[0xffu8; 32][..], &[1u8; 5][..]] {
            assert_eq!(
                engine.open(keys.private_key(), bad, &sealed.nonce, &sealed.sealed, b"aad"),
                Err(DecryptionError)
            );
        }
    }

    #[test]
    fn test_open_is_deterministic() {
        let engine = EncryptionEngine::new(CipherKind::Keystream);
        let keys = KeyPair::generate().unwrap();
        let other = KeyPair::generate().unwrap();
        let sealed = engine.seal(keys.public_key(), b"payload", b"aad").unwrap();

        let first = engine.open(other.private_key(), &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed, b"aad");
        let second = engine.open(other.private_key(), &sealed.ephemeral_pubkey, &sealed.nonce, &sealed.sealed, b"aad");
        assert_eq!(first, second);
    }

    #[test]
    fn test_envelope_helpers_bind_deposit_id() {
        use crate::aad::AadBuilder;
        use crate::address::Address;

        let engine = EncryptionEngine::default();
        let keys = KeyPair::generate().unwrap();
        let builder = AadBuilder::new(270, Address::new([0xab; 20]), "v1");

        let aad = builder.for_deposit(&[1; 32]);
        let envelope = engine.seal_envelope(keys.public_key(), b"payload", &aad).unwrap();
        assert_eq!(envelope.deposit_id, [1; 32]);

        assert_eq!(engine.open_envelope(&keys, &envelope, &aad).unwrap(), b"payload");
        assert!(engine
            .open_envelope(&keys, &envelope, &builder.for_deposit(&[2; 32]))
            .is_err());
    }
}
