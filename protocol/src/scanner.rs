//! Recipient-side discovery of deposits addressed to the caller.
//!
//! For every unclaimed record: unbundle, rebuild the AAD from the record's
//! deposit id, try to open, decode the fixed-layout plaintext and keep it only
//! if it names the caller's own address. Every miss is silent; it is the
//! normal outcome for records sealed to someone else.

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::aad::AadBuilder;
use crate::address::Address;
use crate::commitment::{Commitment, Secret};
use crate::engine::EncryptionEngine;
use crate::envelope::unbundle;
use crate::error::{LedgerError, Result};
use crate::keys::KeyPair;
use crate::ledger::{AccessGrant, RecordRange, RecordSource};
use crate::payload::ClaimPayload;
use crate::record::{DepositId, DepositRecord};

/// Default number of ciphertext fetches kept in flight.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;

/// A deposit that decrypted to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedMatch {
    /// Ledger index of the record
    pub index: u64,
    pub deposit_id: DepositId,
    pub recipient: Address,
    pub secret: Secret,
    pub commitment: Commitment,
    pub amount: u128,
    pub created_at: u64,
    /// Whether the revealed secret hashes to the stored commitment
    pub commitment_ok: bool,
}

/// Why a record was not a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Miss {
    Claimed,
    MalformedEnvelope,
    DepositIdMismatch,
    NotDecryptable,
    InvalidPayload,
    OtherRecipient,
}

impl std::fmt::Display for Miss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Miss::Claimed => "already claimed",
            Miss::MalformedEnvelope => "malformed envelope",
            Miss::DepositIdMismatch => "envelope belongs to another deposit",
            Miss::NotDecryptable => "not decryptable with this key",
            Miss::InvalidPayload => "decrypted payload is malformed",
            Miss::OtherRecipient => "addressed to another recipient",
        };
        f.write_str(reason)
    }
}

/// Outcome of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Matches in original record order
    pub matches: Vec<DecryptedMatch>,
    /// Unclaimed records a decryption was attempted for
    pub examined: usize,
    /// Examined records that were not for the caller
    pub discarded: usize,
    /// Records skipped because they are already claimed
    pub skipped_claimed: usize,
    /// True when the scan stopped early on cancellation
    pub interrupted: bool,
    /// First index not yet examined, when interrupted
    pub resume_from: Option<u64>,
}

/// Cooperative cancellation handle, checked between records.
#[derive(Debug, Clone, Default)]
pub struct ScanCancel(Arc<AtomicBool>);

impl ScanCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Scanner<'a> {
    engine: &'a EncryptionEngine,
    keys: &'a KeyPair,
    own_address: Address,
    aad: &'a AadBuilder,
    concurrency: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(
        engine: &'a EncryptionEngine,
        keys: &'a KeyPair,
        own_address: Address,
        aad: &'a AadBuilder,
    ) -> Self {
        Self {
            engine,
            keys,
            own_address,
            aad,
            concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }

    /// Bound on in-flight ciphertext fetches; at least one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Try one record against the caller's key.
    pub fn try_record(
        &self,
        record: &DepositRecord,
        bundle_bytes: &[u8],
    ) -> std::result::Result<DecryptedMatch, Miss> {
        if record.claimed {
            return Err(Miss::Claimed);
        }

        let envelope = unbundle(bundle_bytes).map_err(|e| {
            warn!(index = record.index, error = %e, "skipping malformed envelope");
            Miss::MalformedEnvelope
        })?;

        // An envelope lifted from another deposit would also fail the AAD
        // check; this catches it without a decryption attempt.
        if envelope.deposit_id != record.deposit_id {
            return Err(Miss::DepositIdMismatch);
        }

        let aad = self.aad.for_deposit(&record.deposit_id);
        let plaintext = self
            .engine
            .open_envelope(self.keys, &envelope, &aad)
            .map_err(|_| Miss::NotDecryptable)?;

        let payload = ClaimPayload::decode(&plaintext).map_err(|_| Miss::InvalidPayload)?;
        if !payload.recipient.ct_matches(&self.own_address) {
            return Err(Miss::OtherRecipient);
        }

        let commitment_ok = payload.secret.matches(&record.commitment);
        Ok(DecryptedMatch {
            index: record.index,
            deposit_id: record.deposit_id,
            recipient: payload.recipient,
            secret: payload.secret,
            commitment: record.commitment,
            amount: record.amount,
            created_at: record.created_at,
            commitment_ok,
        })
    }

    /// Scan records whose bundles are carried inline.
    pub fn scan(&self, records: &[DepositRecord]) -> ScanReport {
        self.scan_cancellable(records, &ScanCancel::new())
    }

    pub fn scan_cancellable(&self, records: &[DepositRecord], cancel: &ScanCancel) -> ScanReport {
        let items = records
            .iter()
            .map(|record| (record, Cow::Borrowed(record.ciphertext.as_slice())));
        self.scan_items(items, cancel)
    }

    /// Scan records whose bundles are looked up by `ciphertext_for`.
    ///
    /// The lookup runs once per unclaimed record, as the scan reaches it. A
    /// record the lookup has no bundle for counts as malformed.
    pub fn scan_with<F>(&self, records: &[DepositRecord], mut ciphertext_for: F) -> ScanReport
    where
        F: FnMut(&DepositRecord) -> Option<Vec<u8>>,
    {
        let items = records.iter().map(|record| {
            let bytes = if record.claimed {
                Vec::new()
            } else {
                ciphertext_for(record).unwrap_or_default()
            };
            (record, Cow::Owned(bytes))
        });
        self.scan_items(items, &ScanCancel::new())
    }

    fn scan_items<'r, I>(&self, items: I, cancel: &ScanCancel) -> ScanReport
    where
        I: Iterator<Item = (&'r DepositRecord, Cow<'r, [u8]>)>,
    {
        let mut report = ScanReport::default();

        for (record, bytes) in items {
            if cancel.is_cancelled() {
                report.interrupted = true;
                report.resume_from = Some(record.index);
                break;
            }
            self.absorb(&mut report, record, &bytes);
        }

        self.log_report(&report);
        report
    }

    /// Read records from `source` and scan them.
    ///
    /// Records listed without an inline bundle are fetched by index, with at
    /// most `concurrency` fetches in flight; results are consumed in record
    /// order. Collaborator failures abort the scan and are returned wrapped.
    pub async fn scan_ledger<S>(
        &self,
        source: &S,
        grant: &AccessGrant,
        range: RecordRange,
        cancel: &ScanCancel,
    ) -> Result<ScanReport>
    where
        S: RecordSource + ?Sized,
    {
        let records = source.list_records(grant, range).await?;
        debug!(count = records.len(), start = range.start, "records listed");

        let mut report = ScanReport::default();
        let mut pending = Vec::with_capacity(records.len());
        for record in &records {
            if record.claimed {
                report.skipped_claimed += 1;
            } else {
                pending.push(record);
            }
        }

        let mut fetched = stream::iter(pending)
            .map(|record| async move {
                let bytes = if record.ciphertext.is_empty() {
                    Cow::Owned(source.fetch_ciphertext(grant, record.index).await?)
                } else {
                    Cow::Borrowed(record.ciphertext.as_slice())
                };
                Ok::<_, LedgerError>((record, bytes))
            })
            .buffered(self.concurrency);

        while let Some(item) = fetched.next().await {
            let (record, bytes) = item?;
            if cancel.is_cancelled() {
                report.interrupted = true;
                report.resume_from = Some(record.index);
                break;
            }
            self.absorb(&mut report, record, &bytes);
        }

        self.log_report(&report);
        Ok(report)
    }

    fn absorb(&self, report: &mut ScanReport, record: &DepositRecord, bundle_bytes: &[u8]) {
        match self.try_record(record, bundle_bytes) {
            Ok(found) => {
                report.examined += 1;
                if !found.commitment_ok {
                    warn!(index = record.index, "decrypted secret does not match stored commitment");
                }
                report.matches.push(found);
            }
            Err(Miss::Claimed) => report.skipped_claimed += 1,
            Err(reason) => {
                report.examined += 1;
                report.discarded += 1;
                debug!(index = record.index, ?reason, "record not addressed to us");
            }
        }
    }

    fn log_report(&self, report: &ScanReport) {
        info!(
            examined = report.examined,
            matches = report.matches.len(),
            skipped_claimed = report.skipped_claimed,
            interrupted = report.interrupted,
            "scan finished"
        );
    }
}
