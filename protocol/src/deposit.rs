//! Sender side: resolve the recipient's key, seal the claim payload and
//! hand the deposit to the submission collaborator.

use rand::{rngs::OsRng, RngCore};
use tracing::info;

use crate::aad::AadBuilder;
use crate::address::Address;
use crate::calls::LedgerCall;
use crate::commitment::{Commitment, Secret};
use crate::engine::EncryptionEngine;
use crate::envelope::EnvelopeBundle;
use crate::error::Result;
use crate::keys::PublicKey;
use crate::ledger::{AccessGrant, KeyDirectory, Submitter, TxRef};
use crate::payload::ClaimPayload;
use crate::record::DepositId;

/// Result of a directory lookup. Malformed keys are an error, not `Absent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLookup {
    Found(PublicKey),
    Absent,
}

/// Look up the key a recipient has published.
pub async fn resolve_recipient_key<D>(
    directory: &D,
    grant: &AccessGrant,
    recipient: &Address,
) -> Result<KeyLookup>
where
    D: KeyDirectory + ?Sized,
{
    match directory.read_public_key(grant, recipient).await? {
        None => Ok(KeyLookup::Absent),
        Some(bytes) => Ok(KeyLookup::Found(PublicKey::from_bytes(&bytes)?)),
    }
}

/// Everything the sender produces for one deposit.
///
/// `secret` stays with the sender; only `commitment` and the bundle go to the
/// ledger.
#[derive(Debug, Clone)]
pub struct PreparedDeposit {
    pub deposit_id: DepositId,
    pub recipient: Address,
    pub secret: Secret,
    pub commitment: Commitment,
    pub envelope: EnvelopeBundle,
}

impl PreparedDeposit {
    pub fn call(&self) -> LedgerCall {
        LedgerCall::Deposit {
            deposit_id: self.deposit_id,
            commitment: self.commitment,
            bundle: self.envelope.to_bytes(),
        }
    }
}

/// Draw a deposit id and secret, and seal `recipient || secret` to the key.
pub fn prepare_deposit(
    engine: &EncryptionEngine,
    aad: &AadBuilder,
    recipient_key: &PublicKey,
    recipient: Address,
) -> Result<PreparedDeposit> {
    let mut deposit_id = [0u8; 32];
    OsRng.fill_bytes(&mut deposit_id);

    let secret = Secret::random();
    let commitment = secret.commitment();

    let plaintext = ClaimPayload::new(recipient, secret.clone()).encode();
    let envelope = engine.seal_envelope(recipient_key, &plaintext, &aad.for_deposit(&deposit_id))?;

    Ok(PreparedDeposit {
        deposit_id,
        recipient,
        secret,
        commitment,
        envelope,
    })
}

/// Submit a prepared deposit. Not retried: a new attempt should be a new
/// deposit with a fresh id.
pub async fn submit_deposit<S>(
    submitter: &S,
    grant: &AccessGrant,
    prepared: &PreparedDeposit,
    value: u128,
) -> Result<TxRef>
where
    S: Submitter + ?Sized,
{
    let tx = submitter.submit(grant, &prepared.call().encode(), value).await?;
    info!(
        deposit_id = %hex::encode(prepared.deposit_id),
        %tx,
        "deposit submitted"
    );
    Ok(tx)
}
