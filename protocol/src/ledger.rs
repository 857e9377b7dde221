//! Boundary contracts with the external ledger, plus an in-memory reference
//! ledger.
//!
//! The core never talks to a chain directly. It needs three capabilities:
//! submit an opaque payload, read stored records and ciphertexts, and look up
//! a recipient's published key. Every call presents an [`AccessGrant`]; there
//! is no ambient authorization state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address::Address;
use crate::calls::LedgerCall;
use crate::commitment::keccak256;
use crate::error::LedgerError;
use crate::record::DepositRecord;

// ============================================================================
// Boundary types
// ============================================================================

/// Capability presented to every collaborator call.
///
/// Issued by whatever authorization layer fronts the ledger; the core only
/// carries it through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    holder: Address,
}

impl AccessGrant {
    pub fn new(holder: Address) -> Self {
        Self { holder }
    }

    pub fn holder(&self) -> &Address {
        &self.holder
    }
}

/// Which slice of the record list to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordRange {
    pub start: u64,
    pub limit: Option<u64>,
}

impl RecordRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from(start: u64) -> Self {
        Self { start, limit: None }
    }
}

/// Reference to a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef(pub String);

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Read access to stored deposit records. May serve stale data.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn list_records(
        &self,
        grant: &AccessGrant,
        range: RecordRange,
    ) -> Result<Vec<DepositRecord>, LedgerError>;

    async fn fetch_ciphertext(&self, grant: &AccessGrant, index: u64) -> Result<Vec<u8>, LedgerError>;
}

/// Opaque transaction submission. Never retried by the core.
#[async_trait]
pub trait Submitter: Send + Sync {
    fn signer_address(&self) -> Address;

    async fn submit(
        &self,
        grant: &AccessGrant,
        payload: &[u8],
        value: u128,
    ) -> Result<TxRef, LedgerError>;
}

/// Published recipient keys. `Ok(None)` means absent; malformed bytes are
/// returned as-is and rejected by the caller.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    async fn read_public_key(
        &self,
        grant: &AccessGrant,
        address: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError>;
}

// ============================================================================
// Ledger state machine
// ============================================================================

/// Ledger contents and the rules a real deployment enforces on-chain:
/// unique deposit ids, a one-shot `claimed` flag and the commitment check.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub records: Vec<DepositRecord>,
    /// Published public keys, hex encoded
    #[serde(default)]
    pub public_keys: BTreeMap<Address, String>,
    /// Released funds per recipient
    #[serde(default)]
    pub payouts: BTreeMap<Address, u128>,
    /// When set, only these holders may read or submit
    #[serde(default)]
    pub allowlist: Option<BTreeSet<Address>>,
    #[serde(default)]
    pub tx_count: u64,
}

impl LedgerState {
    pub fn authorize(&self, grant: &AccessGrant) -> Result<(), LedgerError> {
        match &self.allowlist {
            Some(allowed) if !allowed.contains(grant.holder()) => Err(LedgerError::Unauthorized(
                format!("{} is not an authorized reader", grant.holder()),
            )),
            _ => Ok(()),
        }
    }

    pub fn list(&self, range: RecordRange) -> Vec<DepositRecord> {
        let start = usize::try_from(range.start).unwrap_or(usize::MAX);
        let iter = self.records.iter().skip(start);
        match range.limit {
            Some(limit) => iter.take(usize::try_from(limit).unwrap_or(usize::MAX)).cloned().collect(),
            None => iter.cloned().collect(),
        }
    }

    pub fn ciphertext(&self, index: u64) -> Result<Vec<u8>, LedgerError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.records.get(i))
            .map(|record| record.ciphertext.clone())
            .ok_or(LedgerError::UnknownIndex(index))
    }

    pub fn public_key(&self, address: &Address) -> Option<Vec<u8>> {
        self.public_keys
            .get(address)
            .and_then(|encoded| hex::decode(encoded).ok())
    }

    /// Execute a decoded call from `sender`.
    pub fn apply(
        &mut self,
        sender: &Address,
        payload: &[u8],
        value: u128,
        now: u64,
    ) -> Result<TxRef, LedgerError> {
        let call = LedgerCall::decode(payload)
            .ok_or_else(|| LedgerError::Submission("unrecognized payload".to_string()))?;

        match call {
            LedgerCall::Deposit {
                deposit_id,
                commitment,
                bundle,
            } => {
                if self.records.iter().any(|r| r.deposit_id == deposit_id) {
                    return Err(LedgerError::DuplicateDeposit(hex::encode(deposit_id)));
                }
                let index = self.records.len() as u64;
                self.records.push(DepositRecord {
                    index,
                    deposit_id,
                    commitment,
                    ciphertext: bundle,
                    amount: value,
                    created_at: now,
                    claimed: false,
                });
                debug!(index, "deposit stored");
            }
            LedgerCall::Claim {
                deposit_id,
                secret,
                recipient,
            } => {
                let record = self
                    .records
                    .iter_mut()
                    .find(|r| r.deposit_id == deposit_id)
                    .ok_or_else(|| LedgerError::Submission("unknown deposit".to_string()))?;

                if record.claimed {
                    return Err(LedgerError::Submission("deposit already claimed".to_string()));
                }
                if !secret.matches(&record.commitment) {
                    return Err(LedgerError::Submission("commitment mismatch".to_string()));
                }

                record.claimed = true;
                let amount = record.amount;
                let balance = self.payouts.entry(recipient).or_insert(0);
                *balance = balance.saturating_add(amount);
                debug!(index = record.index, %recipient, "deposit claimed");
            }
            LedgerCall::RegisterKey { public_key } => {
                self.public_keys.insert(*sender, hex::encode(public_key));
            }
        }

        self.tx_count += 1;
        let mut preimage = Vec::with_capacity(20 + 8 + payload.len());
        preimage.extend_from_slice(sender.as_bytes());
        preimage.extend_from_slice(&self.tx_count.to_be_bytes());
        preimage.extend_from_slice(payload);
        Ok(TxRef(format!("0x{}", hex::encode(keccak256(&preimage)))))
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// In-memory ledger
// ============================================================================

/// Thread-safe ledger held in memory. Used by tests and local demos.
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    inline_ciphertexts: bool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            inline_ciphertexts: true,
        }
    }

    /// A ledger whose listings omit bundles, forcing per-index fetches.
    pub fn without_inline_ciphertexts() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            inline_ciphertexts: false,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, LedgerState>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Backend("ledger state lock poisoned".into()))
    }

    pub fn snapshot(&self) -> Result<LedgerState, LedgerError> {
        Ok(self.state()?.clone())
    }

    pub fn set_allowlist(&self, allowed: Option<BTreeSet<Address>>) -> Result<(), LedgerError> {
        self.state()?.allowlist = allowed;
        Ok(())
    }

    /// A submission handle bound to one signer.
    pub fn handle(self: &Arc<Self>, signer: Address) -> LedgerHandle {
        LedgerHandle {
            ledger: Arc::clone(self),
            signer,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordSource for InMemoryLedger {
    async fn list_records(
        &self,
        grant: &AccessGrant,
        range: RecordRange,
    ) -> Result<Vec<DepositRecord>, LedgerError> {
        let state = self.state()?;
        state.authorize(grant)?;
        let records = state.list(range);
        if self.inline_ciphertexts {
            Ok(records)
        } else {
            Ok(records.iter().map(DepositRecord::without_ciphertext).collect())
        }
    }

    async fn fetch_ciphertext(&self, grant: &AccessGrant, index: u64) -> Result<Vec<u8>, LedgerError> {
        let state = self.state()?;
        state.authorize(grant)?;
        state.ciphertext(index)
    }
}

#[async_trait]
impl KeyDirectory for InMemoryLedger {
    async fn read_public_key(
        &self,
        grant: &AccessGrant,
        address: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let state = self.state()?;
        state.authorize(grant)?;
        Ok(state.public_key(address))
    }
}

/// [`InMemoryLedger`] seen through one signer's account.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    ledger: Arc<InMemoryLedger>,
    signer: Address,
}

#[async_trait]
impl Submitter for LedgerHandle {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn submit(
        &self,
        grant: &AccessGrant,
        payload: &[u8],
        value: u128,
    ) -> Result<TxRef, LedgerError> {
        let mut state = self.ledger.state()?;
        state.authorize(grant)?;
        let tx = state.apply(&self.signer, payload, value, unix_now())?;
        info!(signer = %self.signer, %tx, "transaction accepted");
        Ok(tx)
    }
}

#[async_trait]
impl RecordSource for LedgerHandle {
    async fn list_records(
        &self,
        grant: &AccessGrant,
        range: RecordRange,
    ) -> Result<Vec<DepositRecord>, LedgerError> {
        self.ledger.list_records(grant, range).await
    }

    async fn fetch_ciphertext(&self, grant: &AccessGrant, index: u64) -> Result<Vec<u8>, LedgerError> {
        self.ledger.fetch_ciphertext(grant, index).await
    }
}

#[async_trait]
impl KeyDirectory for LedgerHandle {
    async fn read_public_key(
        &self,
        grant: &AccessGrant,
        address: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        self.ledger.read_public_key(grant, address).await
    }
}
