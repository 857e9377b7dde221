//! Recipient key material on edwards25519.
//!
//! Public keys only ever travel in compressed form (32 bytes), which keeps the
//! envelope prefix and the AAD fixed-width.
//!
//! Security features:
//! - Private scalars are range-checked and retried, never silently reduced
//! - Secret bytes are zeroized on drop
//! - Small-order and mixed-torsion public keys are rejected at parse time

use std::fmt;

use curve25519_dalek::{
    constants::ED25519_BASEPOINT_POINT,
    edwards::{CompressedEdwardsY, EdwardsPoint},
    scalar::Scalar,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::KeyError;

/// Length of a private key in bytes.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of a compressed public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Upper bound on scalar draws before key generation gives up.
pub const MAX_KEYGEN_ATTEMPTS: usize = 16;

/// Domain separator for mnemonic-derived recipient keys
const MNEMONIC_DOMAIN: &[u8] = b"stealth-deposit/recipient";

// ============================================================================
// Private Key
// ============================================================================

/// A recipient private scalar that zeroizes its bytes on drop.
///
/// Clone is NOT derived to prevent accidental secret duplication.
pub struct PrivateKey {
    bytes: [u8; 32],
}

impl PrivateKey {
    /// Accept only canonical, non-zero scalars.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        match Scalar::from_canonical_bytes(bytes) {
            Some(scalar) if scalar != Scalar::zero() => Ok(Self { bytes }),
            _ => Err(KeyError::InvalidPrivateKey),
        }
    }

    pub(crate) fn to_scalar(&self) -> Scalar {
        // Canonical by construction
        Scalar::from_bytes_mod_order(self.bytes)
    }

    /// Get the raw bytes (use carefully)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(&self.to_scalar() * &ED25519_BASEPOINT_POINT)
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

// ============================================================================
// Public Key
// ============================================================================

/// A validated, compressed edwards25519 point.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LEN],
    point: EdwardsPoint,
}

impl PublicKey {
    fn from_point(point: EdwardsPoint) -> Self {
        Self {
            bytes: point.compress().to_bytes(),
            point,
        }
    }

    /// Parse a compressed point.
    ///
    /// Rejects encodings that do not decompress, the small-order points
    /// (including the identity) and points outside the prime-order subgroup.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey("expected 32 bytes"))?;

        let point = CompressedEdwardsY(bytes)
            .decompress()
            .ok_or(KeyError::InvalidPublicKey("not a valid curve point"))?;

        if point.is_small_order() {
            return Err(KeyError::InvalidPublicKey("small-order point"));
        }
        if !point.is_torsion_free() {
            return Err(KeyError::InvalidPublicKey("point has a torsion component"));
        }

        Ok(Self { bytes, point })
    }

    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let stripped = input.strip_prefix("0x").unwrap_or(input);
        let bytes = hex::decode(stripped)
            .map_err(|_| KeyError::InvalidPublicKey("not valid hex"))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub(crate) fn point(&self) -> &EdwardsPoint {
        &self.point
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for PublicKey {}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for PublicKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_hex()
    }
}

// ============================================================================
// Key Pair
// ============================================================================

/// Recipient key pair. Owned by the recipient and never transmitted.
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from OS entropy.
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a key pair from the given RNG.
    ///
    /// The top nibble of each draw is cleared so the candidate sits below the
    /// group order; the canonical check still runs on every draw and any
    /// rejected or zero scalar is redrawn.
    pub fn generate_with<R: RngCore>(rng: &mut R) -> Result<Self, KeyError> {
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let mut bytes = [0u8; 32];
            if rng.try_fill_bytes(&mut bytes).is_err() {
                continue;
            }
            bytes[31] &= 0x0f;

            let candidate = PrivateKey::from_bytes(bytes);
            bytes.zeroize();

            if let Ok(private_key) = candidate {
                return Ok(Self::from_private_key(private_key));
            }
        }

        Err(KeyError::GenerationExhausted {
            attempts: MAX_KEYGEN_ATTEMPTS,
        })
    }

    /// Reconstruct a key pair from a stored private key.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        PrivateKey::from_bytes(*bytes).map(Self::from_private_key)
    }

    /// Derive a key pair from a BIP-39 mnemonic phrase.
    ///
    /// Derivation: sk = SHA256("stealth-deposit/recipient" || seed) mod l
    pub fn from_mnemonic(mnemonic_phrase: &str, passphrase: &str) -> Result<Self, KeyError> {
        use bip39::Mnemonic;

        let mnemonic: Mnemonic = mnemonic_phrase
            .parse()
            .map_err(|e: bip39::Error| KeyError::InvalidMnemonic(e.to_string()))?;

        let mut seed = mnemonic.to_seed(passphrase);

        let mut hasher = Sha256::new();
        hasher.update(MNEMONIC_DOMAIN);
        hasher.update(seed);
        let mut digest: [u8; 32] = hasher.finalize().into();
        seed.zeroize();

        let mut reduced = Scalar::from_bytes_mod_order(digest).to_bytes();
        digest.zeroize();

        let result = PrivateKey::from_bytes(reduced).map(Self::from_private_key);
        reduced.zeroize();
        result
    }

    /// Generate a new 24-word mnemonic and derive keys from it.
    pub fn generate_with_mnemonic() -> Result<(Self, String), KeyError> {
        use bip39::Mnemonic;

        let mut entropy = [0u8; 32];
        OsRng.fill_bytes(&mut entropy);

        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| KeyError::InvalidMnemonic(e.to_string()));
        entropy.zeroize();

        let phrase = mnemonic?.to_string();
        let keys = Self::from_mnemonic(&phrase, "")?;

        Ok((keys, phrase))
    }

    fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Export the private key bytes (for encrypted storage)
    ///
    /// WARNING: Handle these bytes with extreme care!
    pub fn export_secret(&self) -> [u8; 32] {
        *self.private_key.as_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}
