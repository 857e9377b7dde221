//! Publish the recipient key under our account

use anyhow::{Context, Result};
use colored::Colorize;
use stealth_deposit::{LedgerCall, Submitter};

use super::Session;

pub async fn run(session: &Session) -> Result<()> {
    let account = session.account()?;
    let public_key = session.storage().read()?.public_key()?;

    println!("{}", format!("Registering recipient key for {}...", account).cyan());

    let ledger = session.ledger()?;
    let call = LedgerCall::RegisterKey {
        public_key: public_key.to_bytes(),
    };
    let tx = ledger
        .submit(&session.grant()?, &call.encode(), 0)
        .await
        .context("Failed to submit key registration")?;

    println!();
    println!("{}", "Recipient key registered successfully!".green().bold());
    println!();
    println!("Transaction: {}", tx);
    println!("Key:         {}", public_key);

    Ok(())
}
