//! Configuration and file locations for the stealthdep CLI

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use stealth_deposit::{Address, ProtocolConfig};

/// Default directory for keys, config and the local ledger
const STEALTH_DIR: &str = ".stealth-deposit";
const CONFIG_FILE: &str = "config.json";
const KEYS_FILE: &str = "keys.enc";
const LEDGER_FILE: &str = "ledger.json";

/// On-disk CLI configuration.
///
/// Protocol fields sit at the top level of the JSON next to the CLI's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub protocol: ProtocolConfig,

    /// File-backed ledger the CLI reads and submits to
    pub ledger_path: PathBuf,

    /// Encrypted recipient key
    pub key_path: PathBuf,

    /// Our ledger account; overridable per invocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<Address>,
}

impl CliConfig {
    /// Defaults rooted at `dir`.
    pub fn default_in(dir: &Path) -> Self {
        Self {
            protocol: ProtocolConfig::default(),
            ledger_path: dir.join(LEDGER_FILE),
            key_path: dir.join(KEYS_FILE),
            account: None,
        }
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults; a present but unreadable one is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let dir = stealth_dir()?;
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => dir.join(CONFIG_FILE),
        };

        if !path.exists() {
            return Ok(Self::default_in(&dir));
        }

        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        parse_config(&json, &dir)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).context("Failed to write config file")?;
        Ok(())
    }

    /// The account to act as: `--account` wins over the config file.
    pub fn resolve_account(&self, overridden: Option<Address>) -> Result<Address> {
        match overridden.or(self.account) {
            Some(account) if !account.is_zero() => Ok(account),
            Some(_) => bail!("The zero address cannot be used as an account"),
            None => bail!(
                "No account configured. Pass --account 0x... or set \"account\" in {}",
                CONFIG_FILE
            ),
        }
    }
}

/// Missing path fields fall back to `dir`; protocol fields to their defaults.
fn parse_config(json: &str, dir: &Path) -> Result<CliConfig> {
    #[derive(Deserialize)]
    struct Partial {
        #[serde(flatten)]
        protocol: ProtocolConfig,
        ledger_path: Option<PathBuf>,
        key_path: Option<PathBuf>,
        account: Option<Address>,
    }

    let partial: Partial = serde_json::from_str(json)?;
    let defaults = CliConfig::default_in(dir);

    Ok(CliConfig {
        protocol: partial.protocol,
        ledger_path: partial.ledger_path.unwrap_or(defaults.ledger_path),
        key_path: partial.key_path.unwrap_or(defaults.key_path),
        account: partial.account,
    })
}

/// Get the stealth-deposit directory path
pub fn stealth_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(STEALTH_DIR))
        .context("Could not find home directory")
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(stealth_dir()?.join(CONFIG_FILE))
}
