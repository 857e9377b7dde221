//! JSON file-backed ledger
//!
//! Lets the CLI run the whole deposit/scan/claim cycle locally. The file
//! holds a serialized [`LedgerState`]; every submission is a
//! read-apply-write under a process-local lock, with the write going through
//! a temporary file and a rename.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use stealth_deposit::ledger::unix_now;
use stealth_deposit::{
    AccessGrant, Address, DepositRecord, KeyDirectory, LedgerError, LedgerState, RecordRange,
    RecordSource, Submitter, TxRef,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FileLedgerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt ledger file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileLedgerError> for LedgerError {
    fn from(err: FileLedgerError) -> Self {
        LedgerError::Backend(Box::new(err))
    }
}

pub struct FileLedger {
    path: PathBuf,
    signer: Address,
    write_lock: Mutex<()>,
}

impl FileLedger {
    /// Open the ledger at `path` acting as `signer`. The file is created on
    /// first write.
    pub fn open(path: impl Into<PathBuf>, signer: Address) -> Self {
        Self {
            path: path.into(),
            signer,
            write_lock: Mutex::new(()),
        }
    }

    /// Current contents; a missing file is an empty ledger.
    pub async fn load(&self) -> Result<LedgerState, FileLedgerError> {
        let json = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LedgerState::default()),
            Err(source) => {
                return Err(FileLedgerError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&json).map_err(|source| FileLedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn store(&self, state: &LedgerState) -> Result<(), FileLedgerError> {
        let io_err = |source| FileLedgerError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(state).map_err(|source| FileLedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl Submitter for FileLedger {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn submit(
        &self,
        grant: &AccessGrant,
        payload: &[u8],
        value: u128,
    ) -> Result<TxRef, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let mut state = self.load().await?;
        state.authorize(grant)?;
        let tx = state.apply(&self.signer, payload, value, unix_now())?;
        self.store(&state).await?;

        info!(signer = %self.signer, %tx, path = %self.path.display(), "transaction written");
        Ok(tx)
    }
}

#[async_trait]
impl RecordSource for FileLedger {
    async fn list_records(
        &self,
        grant: &AccessGrant,
        range: RecordRange,
    ) -> Result<Vec<DepositRecord>, LedgerError> {
        let state = self.load().await?;
        state.authorize(grant)?;
        let records = state.list(range);
        debug!(count = records.len(), "records read from file");
        Ok(records)
    }

    async fn fetch_ciphertext(&self, grant: &AccessGrant, index: u64) -> Result<Vec<u8>, LedgerError> {
        let state = self.load().await?;
        state.authorize(grant)?;
        state.ciphertext(index)
    }
}

#[async_trait]
impl KeyDirectory for FileLedger {
    async fn read_public_key(
        &self,
        grant: &AccessGrant,
        address: &Address,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let state = self.load().await?;
        state.authorize(grant)?;
        Ok(state.public_key(address))
    }
}
