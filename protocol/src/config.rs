//! Per-deployment protocol parameters.

use serde::{Deserialize, Serialize};

use crate::aad::{AadBuilder, DEFAULT_CONTEXT_LABEL};
use crate::address::Address;
use crate::cipher::CipherKind;
use crate::engine::EncryptionEngine;
use crate::scanner::DEFAULT_SCAN_CONCURRENCY;

/// Destination chain id used when none is configured.
pub const DEFAULT_CHAIN_ID: u64 = 270;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Destination chain id bound into every AAD
    pub chain_id: u64,
    /// Destination contract bound into every AAD
    pub contract: Address,
    /// Protocol version label; the AAD carries its Keccak-256 digest
    pub context_label: String,
    pub cipher: CipherKind,
    /// Ciphertext fetches in flight while scanning
    pub scan_concurrency: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            contract: Address::ZERO,
            context_label: DEFAULT_CONTEXT_LABEL.to_string(),
            cipher: CipherKind::default(),
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }
}

impl ProtocolConfig {
    pub fn aad_builder(&self) -> AadBuilder {
        AadBuilder::new(self.chain_id, self.contract, &self.context_label)
    }

    pub fn engine(&self) -> EncryptionEngine {
        EncryptionEngine::new(self.cipher)
    }
}
