//! Opaque payloads handed to the submission collaborator.
//!
//! A one-byte selector followed by fixed-width fields; a deposit's envelope
//! bundle is the variable-length tail.
//!
//! ```text
//! 0x01 deposit:      deposit_id(32) | commitment(32) | bundle(..)
//! 0x02 claim:        deposit_id(32) | secret(32) | recipient(20)
//! 0x03 register key: public_key(32)
//! ```

use crate::address::{Address, ADDRESS_LEN};
use crate::commitment::{Commitment, Secret, SECRET_LEN};
use crate::keys::PUBLIC_KEY_LEN;
use crate::record::DepositId;

pub const SELECTOR_DEPOSIT: u8 = 0x01;
pub const SELECTOR_CLAIM: u8 = 0x02;
pub const SELECTOR_REGISTER_KEY: u8 = 0x03;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Deposit {
        deposit_id: DepositId,
        commitment: Commitment,
        bundle: Vec<u8>,
    },
    Claim {
        deposit_id: DepositId,
        secret: Secret,
        recipient: Address,
    },
    RegisterKey {
        public_key: [u8; PUBLIC_KEY_LEN],
    },
}

impl LedgerCall {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            LedgerCall::Deposit {
                deposit_id,
                commitment,
                bundle,
            } => {
                let mut out = Vec::with_capacity(1 + 64 + bundle.len());
                out.push(SELECTOR_DEPOSIT);
                out.extend_from_slice(deposit_id);
                out.extend_from_slice(commitment);
                out.extend_from_slice(bundle);
                out
            }
            LedgerCall::Claim {
                deposit_id,
                secret,
                recipient,
            } => {
                let mut out = Vec::with_capacity(1 + 32 + SECRET_LEN + ADDRESS_LEN);
                out.push(SELECTOR_CLAIM);
                out.extend_from_slice(deposit_id);
                out.extend_from_slice(secret.as_bytes());
                out.extend_from_slice(recipient.as_bytes());
                out
            }
            LedgerCall::RegisterKey { public_key } => {
                let mut out = Vec::with_capacity(1 + PUBLIC_KEY_LEN);
                out.push(SELECTOR_REGISTER_KEY);
                out.extend_from_slice(public_key);
                out
            }
        }
    }

    /// Returns `None` for unknown selectors or wrong field widths.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let (&selector, body) = payload.split_first()?;

        match selector {
            SELECTOR_DEPOSIT if body.len() >= 64 => Some(LedgerCall::Deposit {
                deposit_id: body[..32].try_into().ok()?,
                commitment: body[32..64].try_into().ok()?,
                bundle: body[64..].to_vec(),
            }),
            SELECTOR_CLAIM if body.len() == 32 + SECRET_LEN + ADDRESS_LEN => {
                let secret: [u8; SECRET_LEN] = body[32..64].try_into().ok()?;
                Some(LedgerCall::Claim {
                    deposit_id: body[..32].try_into().ok()?,
                    secret: Secret::from_bytes(secret),
                    recipient: Address::from_slice(&body[64..])?,
                })
            }
            SELECTOR_REGISTER_KEY if body.len() == PUBLIC_KEY_LEN => Some(LedgerCall::RegisterKey {
                public_key: body.try_into().ok()?,
            }),
            _ => None,
        }
    }
}
