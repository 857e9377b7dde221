//! Commit/reveal secrets.
//!
//! commitment = Keccak256(secret), the same digest the ledger recomputes inside
//! its claim transaction.

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use sha3::{Digest, Keccak256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

pub const SECRET_LEN: usize = 32;

/// A 32-byte commitment digest as stored on the ledger.
pub type Commitment = [u8; 32];

/// Keccak-256 over arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The per-deposit reveal secret. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; SECRET_LEN]);

impl Secret {
    /// Draw a fresh secret from OS entropy.
    pub fn random() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn commitment(&self) -> Commitment {
        keccak256(&self.0)
    }

    /// Constant-time check against a stored commitment.
    pub fn matches(&self, commitment: &Commitment) -> bool {
        bool::from(self.commitment().ct_eq(commitment))
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}
