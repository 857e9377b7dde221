//! Fixed-layout claim plaintext: recipient (20B) || secret (32B).
//!
//! One layout for every deposit. Decoding is strict because the keystream
//! cipher has no tag: a wrong-key open yields garbage of the right length and
//! only the structural checks here and the recipient match in the scanner
//! stand between that garbage and a false positive.

use crate::address::{Address, ADDRESS_LEN};
use crate::commitment::{Secret, SECRET_LEN};
use crate::error::PayloadError;

pub const CLAIM_PAYLOAD_LEN: usize = ADDRESS_LEN + SECRET_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPayload {
    pub recipient: Address,
    pub secret: Secret,
}

impl ClaimPayload {
    pub fn new(recipient: Address, secret: Secret) -> Self {
        Self { recipient, secret }
    }

    pub fn encode(&self) -> [u8; CLAIM_PAYLOAD_LEN] {
        let mut out = [0u8; CLAIM_PAYLOAD_LEN];
        out[..ADDRESS_LEN].copy_from_slice(self.recipient.as_bytes());
        out[ADDRESS_LEN..].copy_from_slice(self.secret.as_bytes());
        out
    }

    /// Reject anything but an exact-length buffer naming a non-zero address.
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() != CLAIM_PAYLOAD_LEN {
            return Err(PayloadError::WrongLength {
                expected: CLAIM_PAYLOAD_LEN,
                actual: bytes.len(),
            });
        }

        let (recipient_bytes, secret_bytes) = bytes.split_at(ADDRESS_LEN);
        let recipient = Address::from_slice(recipient_bytes).ok_or(PayloadError::WrongLength {
            expected: CLAIM_PAYLOAD_LEN,
            actual: bytes.len(),
        })?;
        if recipient.is_zero() {
            return Err(PayloadError::ZeroAddress);
        }

        let mut secret = [0u8; SECRET_LEN];
        secret.copy_from_slice(secret_bytes);

        Ok(Self {
            recipient,
            secret: Secret::from_bytes(secret),
        })
    }
}
