//! Stealth deposits across ledgers.
//!
//! A sender on one ledger funds a recipient on another without naming the
//! recipient publicly. The deposit record carries only a random id, a
//! commitment `Keccak256(secret)` and an envelope sealed to the recipient's
//! key under domain-bound AAD. The recipient scans records off-chain, opens
//! the one addressed to them, learns the secret and reveals it to claim.
//!
//! ## Flow
//!
//! 1. Sender: [`resolve_recipient_key`] → [`prepare_deposit`] → [`submit_deposit`]
//! 2. Recipient: [`Scanner::scan_ledger`] → [`check_claim`] → [`submit_claim`]
//!
//! Everything that talks to a ledger goes through the traits in [`ledger`].

pub mod aad;
pub mod address;
pub mod calls;
pub mod cipher;
pub mod claim;
pub mod commitment;
pub mod config;
pub mod deposit;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod payload;
pub mod record;
pub mod scanner;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod test_vectors;


pub use aad::{Aad, AadBuilder, AAD_LEN};
pub use address::Address;
pub use calls::LedgerCall;
pub use cipher::{AesGcmCipher, CipherKind, KeystreamCipher, PayloadCipher};
pub use claim::{check_claim, submit_claim, validate_claim};
pub use commitment::{keccak256, Commitment, Secret};
pub use config::ProtocolConfig;
pub use deposit::{prepare_deposit, resolve_recipient_key, submit_deposit, KeyLookup, PreparedDeposit};
pub use engine::{EncryptionEngine, SealedPayload, MAX_PLAINTEXT_LEN};
pub use envelope::{bundle, unbundle, EnvelopeBundle};
pub use error::{
    ClaimValidationError, DecryptionError, DepositError, EncryptionError, EnvelopeError, KeyError,
    LedgerError, PayloadError, Result,
};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use ledger::{
    AccessGrant, InMemoryLedger, KeyDirectory, LedgerHandle, LedgerState, RecordRange,
    RecordSource, Submitter, TxRef,
};
pub use payload::ClaimPayload;
pub use record::{DepositId, DepositRecord};
pub use scanner::{DecryptedMatch, Miss, ScanCancel, ScanReport, Scanner};
