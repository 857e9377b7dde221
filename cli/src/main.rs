//! stealthdep - command line interface for stealth deposits

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stealth_deposit::{Address, CipherKind};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod ledger_file;
mod secure_storage;


use commands::*;
use config::{default_config_path, CliConfig};

#[derive(Parser)]
#[command(name = "stealthdep")]
#[command(version = "0.1.0")]
#[command(about = "Stealth deposits - fund a recipient without naming them on-chain")]
#[command(long_about = r#"
stealthdep sends deposits whose recipient is hidden inside an envelope only
the recipient's key can open. The recipient scans the ledger, recovers the
secret and reveals it to claim.

Quick Start:
  1. stealthdep init --account 0x..   Write a config file
  2. stealthdep keygen                Generate your recipient key
  3. stealthdep register              Publish it for your account
  4. stealthdep scan                  Check for incoming deposits
  5. stealthdep claim --deposit 0x..  Claim one
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger account to act as (overrides the config file)
    #[arg(long, global = true)]
    account: Option<Address>,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file
    Init {
        #[arg(short, long)]
        force: bool,

        #[arg(long)]
        chain_id: Option<u64>,

        /// Destination contract bound into every envelope
        #[arg(long)]
        contract: Option<Address>,

        /// Protocol version label
        #[arg(long)]
        context_label: Option<String>,

        /// aes-gcm (default) or keystream
        #[arg(long)]
        cipher: Option<CipherKind>,
    },

    /// Generate a new recipient key
    Keygen {
        /// Force overwrite existing key
        #[arg(short, long)]
        force: bool,

        /// Skip the recovery phrase (the key cannot be rebuilt without the file)
        #[arg(long)]
        no_mnemonic: bool,

        /// Import from existing recovery phrase
        #[arg(long)]
        import_mnemonic: Option<String>,

        /// Passphrase for mnemonic (optional extra security)
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Show your recipient key
    Address,

    /// Publish your recipient key for your account
    Register,

    /// Send a stealth deposit
    Deposit {
        /// Recipient account (0x-prefixed, 20 bytes)
        #[arg(short, long)]
        to: Address,

        /// Amount in ledger base units
        #[arg(short, long)]
        amount: u128,
    },

    /// Scan for incoming deposits
    Scan {
        /// First record index to scan
        #[arg(long, default_value_t = 0)]
        from: u64,

        /// Maximum number of records to scan
        #[arg(long)]
        limit: Option<u64>,
    },

    /// Claim a deposit found by scanning
    Claim {
        /// Deposit id (hex)
        #[arg(short, long)]
        deposit: String,
    },

    /// Show configuration and key info
    Info,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = CliConfig::load(Some(&config_path))?;

    let session = Session::new(config, cli.account);
    dispatch(&session, cli.command, &config_path).await
}

async fn dispatch(session: &Session, command: Commands, config_path: &std::path::Path) -> Result<()> {
    match command {
        Commands::Init {
            force,
            chain_id,
            contract,
            context_label,
            cipher,
        } => {
            init::run(
                session.config.clone(),
                config_path,
                init::InitOptions {
                    force,
                    account: session.account_override,
                    chain_id,
                    contract,
                    context_label,
                    cipher,
                },
            )?;
        }
        Commands::Keygen {
            force,
            no_mnemonic,
            import_mnemonic,
            passphrase,
        } => {
            keygen::run(
                session,
                keygen::KeygenOptions {
                    force,
                    with_mnemonic: !no_mnemonic,
                    import_mnemonic,
                    passphrase,
                },
            )?;
        }
        Commands::Address => {
            address::run(session)?;
        }
        Commands::Register => {
            register::run(session).await?;
        }
        Commands::Deposit { to, amount } => {
            deposit::run(session, to, amount).await?;
        }
        Commands::Scan { from, limit } => {
            scan::run(session, from, limit).await?;
        }
        Commands::Claim { deposit } => {
            claim::run(session, &deposit).await?;
        }
        Commands::Info => {
            info::run(session, config_path).await?;
        }
    }

    Ok(())
}
