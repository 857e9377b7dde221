//! Domain-binding additional authenticated data.
//!
//! Layout (116 bytes, every field fixed-width and positionally fixed):
//!
//! ```text
//! [ chain_id: u256 BE (32) | contract (20) | context_tag (32) | deposit_id (32) ]
//! ```
//!
//! A ciphertext sealed under one AAD will not open under any other, so an
//! envelope cannot be replayed on another chain, contract, protocol version or
//! deposit.

use crate::address::{Address, ADDRESS_LEN};
use crate::commitment::keccak256;
use crate::record::DepositId;

pub const CHAIN_ID_LEN: usize = 32;
pub const CONTEXT_TAG_LEN: usize = 32;
pub const DEPOSIT_ID_LEN: usize = 32;
pub const AAD_LEN: usize = CHAIN_ID_LEN + ADDRESS_LEN + CONTEXT_TAG_LEN + DEPOSIT_ID_LEN;

/// Default protocol context label; the tag is its Keccak-256 digest.
pub const DEFAULT_CONTEXT_LABEL: &str = "v1";

/// Packed AAD for one deposit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Aad([u8; AAD_LEN]);

impl Aad {
    pub fn pack(
        chain_id: u64,
        contract: &Address,
        context_tag: &[u8; CONTEXT_TAG_LEN],
        deposit_id: &DepositId,
    ) -> Self {
        let mut out = [0u8; AAD_LEN];
        let mut offset = 0;

        // uint256 big-endian word; the low 8 bytes carry the id
        out[CHAIN_ID_LEN - 8..CHAIN_ID_LEN].copy_from_slice(&chain_id.to_be_bytes());
        offset += CHAIN_ID_LEN;

        out[offset..offset + ADDRESS_LEN].copy_from_slice(contract.as_bytes());
        offset += ADDRESS_LEN;

        out[offset..offset + CONTEXT_TAG_LEN].copy_from_slice(context_tag);
        offset += CONTEXT_TAG_LEN;

        out[offset..offset + DEPOSIT_ID_LEN].copy_from_slice(deposit_id);
        offset += DEPOSIT_ID_LEN;

        debug_assert_eq!(offset, AAD_LEN);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; AAD_LEN] {
        &self.0
    }

    /// The deposit id occupies the trailing 32 bytes.
    pub fn deposit_id(&self) -> DepositId {
        let mut id = [0u8; DEPOSIT_ID_LEN];
        id.copy_from_slice(&self.0[AAD_LEN - DEPOSIT_ID_LEN..]);
        id
    }
}

impl AsRef<[u8]> for Aad {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Aad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Aad({})", hex::encode(self.0))
    }
}

/// Everything but the deposit id, fixed per deployment.
///
/// The scanner calls [`AadBuilder::for_deposit`] once per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AadBuilder {
    chain_id: u64,
    contract: Address,
    context_tag: [u8; CONTEXT_TAG_LEN],
}

impl AadBuilder {
    /// Build from a context label; the tag is `Keccak256(label)`.
    pub fn new(chain_id: u64, contract: Address, context_label: &str) -> Self {
        Self::with_tag(chain_id, contract, keccak256(context_label.as_bytes()))
    }

    pub fn with_tag(chain_id: u64, contract: Address, context_tag: [u8; CONTEXT_TAG_LEN]) -> Self {
        Self {
            chain_id,
            contract,
            context_tag,
        }
    }

    pub fn for_deposit(&self, deposit_id: &DepositId) -> Aad {
        Aad::pack(self.chain_id, &self.contract, &self.context_tag, deposit_id)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    pub fn context_tag(&self) -> &[u8; CONTEXT_TAG_LEN] {
        &self.context_tag
    }
}
