pub mod address;
pub mod claim;
pub mod deposit;
pub mod info;
pub mod init;
pub mod keygen;
pub mod register;
pub mod scan;

use anyhow::Result;
use stealth_deposit::{AccessGrant, Address};

use crate::config::CliConfig;
use crate::ledger_file::FileLedger;
use crate::secure_storage::SecureKeyStorage;

/// Loaded configuration plus per-invocation overrides.
pub struct Session {
    pub config: CliConfig,
    pub account_override: Option<Address>,
}

impl Session {
    pub fn new(config: CliConfig, account_override: Option<Address>) -> Self {
        Self {
            config,
            account_override,
        }
    }

    pub fn account(&self) -> Result<Address> {
        self.config.resolve_account(self.account_override)
    }

    /// The local ledger acts as its own authorization layer and issues a
    /// grant to whichever account is configured.
    pub fn grant(&self) -> Result<AccessGrant> {
        Ok(AccessGrant::new(self.account()?))
    }

    pub fn ledger(&self) -> Result<FileLedger> {
        Ok(FileLedger::open(&self.config.ledger_path, self.account()?))
    }

    pub fn storage(&self) -> SecureKeyStorage {
        SecureKeyStorage::new(self.config.key_path.clone())
    }
}
