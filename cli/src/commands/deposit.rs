//! Send a stealth deposit to a registered recipient

use anyhow::{bail, Context, Result};
use colored::Colorize;
use stealth_deposit::{prepare_deposit, resolve_recipient_key, submit_deposit, Address, KeyLookup};

use super::Session;

pub async fn run(session: &Session, recipient: Address, amount: u128) -> Result<()> {
    if amount == 0 {
        bail!("Deposit amount must be greater than zero");
    }
    if recipient.is_zero() {
        bail!("Cannot deposit to the zero address");
    }

    println!("{}", "Preparing stealth deposit...".cyan());

    let ledger = session.ledger()?;
    let grant = session.grant()?;

    let recipient_key = match resolve_recipient_key(&ledger, &grant, &recipient)
        .await
        .context("Failed to look up recipient key")?
    {
        KeyLookup::Found(key) => key,
        KeyLookup::Absent => bail!(
            "{} has not registered a recipient key. Ask them to run 'stealthdep register'.",
            recipient
        ),
    };

    let protocol = &session.config.protocol;
    let engine = protocol.engine();
    let prepared = prepare_deposit(&engine, &protocol.aad_builder(), &recipient_key, recipient)
        .context("Failed to seal deposit")?;

    println!("Deposit id:  0x{}", hex::encode(prepared.deposit_id));
    println!("Commitment:  0x{}", hex::encode(prepared.commitment));
    println!("Cipher:      {}", engine.cipher_kind());

    println!("Sending {}...", amount);
    let tx = submit_deposit(&ledger, &grant, &prepared, amount)
        .await
        .context("Failed to submit deposit")?;

    println!();
    println!("{}", "Deposit sent successfully!".green().bold());
    println!();
    println!("Transaction: {}", tx);
    println!("Amount:      {}", amount);
    println!();
    println!("{}:", "Secret (keep private; the recipient recovers it by scanning)".yellow());
    println!("  0x{}", prepared.secret.to_hex());
    println!();
    println!(
        "{}",
        "The recipient can find this deposit with 'stealthdep scan'.".dimmed()
    );

    Ok(())
}
