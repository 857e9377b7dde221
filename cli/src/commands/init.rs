//! Write a configuration file

use std::path::Path;

use anyhow::{bail, Result};
use colored::Colorize;
use stealth_deposit::{Address, CipherKind, EncryptionEngine};

use crate::config::CliConfig;

pub struct InitOptions {
    pub force: bool,
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub contract: Option<Address>,
    pub context_label: Option<String>,
    pub cipher: Option<CipherKind>,
}

/// Start from the current configuration and overwrite the given fields.
pub fn run(mut config: CliConfig, path: &Path, options: InitOptions) -> Result<()> {
    if path.exists() && !options.force {
        bail!("Config file {} already exists. Use --force to overwrite.", path.display());
    }

    if let Some(account) = options.account {
        config.account = Some(account);
    }
    if let Some(chain_id) = options.chain_id {
        config.protocol.chain_id = chain_id;
    }
    if let Some(contract) = options.contract {
        config.protocol.contract = contract;
    }
    if let Some(label) = options.context_label {
        config.protocol.context_label = label;
    }
    if let Some(cipher) = options.cipher {
        if !EncryptionEngine::new(cipher).is_authenticated() {
            println!(
                "{}",
                "Warning: the keystream cipher does not detect tampering; prefer aes-gcm.".yellow()
            );
        }
        config.protocol.cipher = cipher;
    }

    config.save(path)?;

    println!("{}", "Configuration written.".green().bold());
    println!("  {}", path.display());
    Ok(())
}
