//! Show configuration, key and ledger status

use anyhow::Result;
use colored::Colorize;
use stealth_deposit::{keccak256, RecordRange, RecordSource};

use super::Session;

pub async fn run(session: &Session, config_path: &std::path::Path) -> Result<()> {
    let config = &session.config;
    let protocol = &config.protocol;

    println!();
    println!("{}", "Stealth Deposit Configuration".yellow().bold());
    println!();

    println!("{}:", "Protocol".cyan());
    println!("  Chain id:    {}", protocol.chain_id);
    println!("  Contract:    {}", protocol.contract);
    println!(
        "  Context:     {} (0x{})",
        protocol.context_label,
        hex::encode(&keccak256(protocol.context_label.as_bytes())[..8])
    );
    println!("  Cipher:      {}", protocol.cipher);
    println!("  Concurrency: {}", protocol.scan_concurrency);
    println!();

    let storage = session.storage();
    match storage.read() {
        Ok(stored) => {
            println!("{}", "Recipient Key: CONFIGURED".green());
            println!("  Created:     {}", stored.created_at);
            println!("  Public key:  {}", stored.public_key);
            println!("  Recoverable: {}", if stored.recoverable { "yes" } else { "no" });
        }
        Err(_) => {
            println!("{}", "Recipient Key: NOT CONFIGURED".red());
            println!("  Run 'stealthdep keygen' to generate a key");
        }
    }
    println!();

    println!("{}:", "Account".cyan());
    match session.account() {
        Ok(account) => {
            println!("  Address: {}", account);
            let ledger = session.ledger()?;
            let grant = session.grant()?;
            match ledger.list_records(&grant, RecordRange::all()).await {
                Ok(records) => {
                    let open = records.iter().filter(|r| !r.claimed).count();
                    println!("  Ledger:  {} deposit(s), {} unclaimed", records.len(), open);
                }
                Err(e) => println!("  Ledger:  {}", format!("unreadable ({})", e).red()),
            }
        }
        Err(_) => {
            println!("  {}", "NOT CONFIGURED".red());
            println!("  Pass --account 0x... or set \"account\" in the config file");
        }
    }
    println!();

    println!("{}:", "File Locations".cyan());
    println!("  Config: {}", config_path.display());
    println!("  Keys:   {}", config.key_path.display());
    println!("  Ledger: {}", config.ledger_path.display());

    Ok(())
}
