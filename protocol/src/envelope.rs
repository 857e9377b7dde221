//! Envelope bundle wire format.
//!
//! Format:
//! [deposit_id(32B) | ephemeral_pubkey(32B) | nonce(12B) | sealed ciphertext]
//!
//! Every field but the last is fixed-width, so no length prefixes are needed:
//! the sealed ciphertext is whatever remains after the prefix.

use crate::aad::DEPOSIT_ID_LEN;
use crate::error::EnvelopeError;
use crate::keys::PUBLIC_KEY_LEN;
use crate::record::DepositId;

pub const NONCE_LEN: usize = 12;
pub const HEADER_LEN: usize = DEPOSIT_ID_LEN + PUBLIC_KEY_LEN + NONCE_LEN;

/// Parsed envelope bundle.
///
/// The ephemeral key is kept as raw bytes here; it is validated as a curve
/// point only when the engine tries to open the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeBundle {
    pub deposit_id: DepositId,
    pub ephemeral_pubkey: [u8; PUBLIC_KEY_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub sealed: Vec<u8>,
}

impl EnvelopeBundle {
    /// Serialize the bundle to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        bundle(&self.deposit_id, &self.ephemeral_pubkey, &self.nonce, &self.sealed)
    }

    /// Parse a bundle from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, EnvelopeError> {
        unbundle(data)
    }
}

/// Concatenate the fixed prefix and the ciphertext.
pub fn bundle(
    deposit_id: &DepositId,
    ephemeral_pubkey: &[u8; PUBLIC_KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + sealed.len());
    out.extend_from_slice(deposit_id);
    out.extend_from_slice(ephemeral_pubkey);
    out.extend_from_slice(nonce);
    out.extend_from_slice(sealed);
    out
}

/// Split a buffer back into its fields.
pub fn unbundle(data: &[u8]) -> Result<EnvelopeBundle, EnvelopeError> {
    if data.len() < HEADER_LEN {
        return Err(EnvelopeError::Malformed {
            actual: data.len(),
            minimum: HEADER_LEN,
        });
    }

    let mut offset = 0;

    let mut deposit_id = [0u8; DEPOSIT_ID_LEN];
    deposit_id.copy_from_slice(&data[offset..offset + DEPOSIT_ID_LEN]);
    offset += DEPOSIT_ID_LEN;

    let mut ephemeral_pubkey = [0u8; PUBLIC_KEY_LEN];
    ephemeral_pubkey.copy_from_slice(&data[offset..offset + PUBLIC_KEY_LEN]);
    offset += PUBLIC_KEY_LEN;

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&data[offset..offset + NONCE_LEN]);
    offset += NONCE_LEN;

    let sealed = data[offset..].to_vec();

    Ok(EnvelopeBundle {
        deposit_id,
        ephemeral_pubkey,
        nonce,
        sealed,
    })
}
