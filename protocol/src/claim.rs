//! Commit/reveal claim checks.
//!
//! Client-side validation is advisory: it exists to avoid submitting a claim
//! the ledger will reject. The ledger's own check is the only authority over
//! fund release.

use tracing::info;

use crate::calls::LedgerCall;
use crate::commitment::Secret;
use crate::error::{ClaimValidationError, Result};
use crate::ledger::{AccessGrant, Submitter, TxRef};
use crate::record::DepositRecord;
use crate::scanner::DecryptedMatch;

/// True iff the record is unclaimed and `Hash(secret)` equals its commitment.
pub fn validate_claim(record: &DepositRecord, revealed: &Secret) -> bool {
    check_claim(record, revealed).is_ok()
}

pub fn check_claim(
    record: &DepositRecord,
    revealed: &Secret,
) -> std::result::Result<(), ClaimValidationError> {
    if record.claimed {
        return Err(ClaimValidationError::AlreadyClaimed);
    }
    if !revealed.matches(&record.commitment) {
        return Err(ClaimValidationError::CommitmentMismatch);
    }
    Ok(())
}

/// Check locally, then submit the claim once.
///
/// `record` should be the freshest copy the caller has; a stale copy can pass
/// here and still be rejected by the ledger.
pub async fn submit_claim<S>(
    submitter: &S,
    grant: &AccessGrant,
    record: &DepositRecord,
    found: &DecryptedMatch,
) -> Result<TxRef>
where
    S: Submitter + ?Sized,
{
    check_claim(record, &found.secret)?;

    let call = LedgerCall::Claim {
        deposit_id: record.deposit_id,
        secret: found.secret.clone(),
        recipient: found.recipient,
    };
    let tx = submitter.submit(grant, &call.encode(), 0).await?;

    info!(index = record.index, %tx, "claim submitted");
    Ok(tx)
}
