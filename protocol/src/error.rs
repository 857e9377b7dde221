//! Error taxonomy for the stealth-deposit core.
//!
//! Each stage has its own error type so callers can tell the fatal sender-side
//! failures apart from the silent, expected decryption misses produced while
//! scanning.

use thiserror::Error;

/// Key generation and key parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The entropy source never produced a usable scalar.
    #[error("Key generation failed after {attempts} attempts: no valid scalar drawn")]
    GenerationExhausted { attempts: usize },

    /// A stored secret is not a canonical, non-zero scalar.
    #[error("Invalid private key - not a canonical non-zero scalar")]
    InvalidPrivateKey,

    /// Bytes do not encode an acceptable curve point.
    #[error("Invalid public key - {0}")]
    InvalidPublicKey(&'static str),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

/// Sender-side sealing failures. Surfaced immediately, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Plaintext too large: {actual} bytes exceeds maximum {max}")]
    PlaintextTooLarge { actual: usize, max: usize },

    #[error("Cipher failure while sealing")]
    Cipher,
}

/// Opening failed. Expected for every record not addressed to the caller.
///
/// Deliberately carries no detail: a wrong key, a wrong AAD and a tampered
/// ciphertext are indistinguishable to the caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Decryption failed")]
pub struct DecryptionError;

/// The envelope bundle is structurally unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Malformed envelope: {actual} bytes, minimum {minimum}")]
    Malformed { actual: usize, minimum: usize },
}

/// Claim plaintext could not be decoded into `{ recipient, secret }`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Claim payload has wrong length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Claim payload names the zero address")]
    ZeroAddress,
}

/// Client-side claim check failed. Advisory: the ledger remains authoritative.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimValidationError {
    #[error("Commitment mismatch - revealed secret does not hash to the stored commitment")]
    CommitmentMismatch,

    #[error("Deposit already claimed")]
    AlreadyClaimed,
}

/// Failures reported by an external ledger collaborator.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Submission rejected: {0}")]
    Submission(String),

    #[error("Duplicate deposit id {0}")]
    DuplicateDeposit(String),

    #[error("No deposit record at index {0}")]
    UnknownIndex(u64),

    #[error("Access denied: {0}")]
    Unauthorized(String),

    #[error("Ledger backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Crate-level error with conversions from every stage.
#[derive(Error, Debug)]
pub enum DepositError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("{0}")]
    Decryption(#[from] DecryptionError),

    #[error("{0}")]
    Envelope(#[from] EnvelopeError),

    #[error("{0}")]
    Payload(#[from] PayloadError),

    #[error("Claim validation error: {0}")]
    ClaimValidation(#[from] ClaimValidationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, DepositError>;
