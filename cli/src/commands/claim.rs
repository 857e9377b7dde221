//! Claim a deposit by revealing its secret

use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use stealth_deposit::{submit_claim, DepositId, DepositRecord, RecordRange, RecordSource, Scanner};

use super::Session;

pub fn parse_deposit_id(input: &str) -> Result<DepositId> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(trimmed).context("Deposit id is not valid hex")?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow!("Deposit id must be 32 bytes, got {}", bytes.len()))
}

pub async fn run(session: &Session, deposit: &str) -> Result<()> {
    let deposit_id = parse_deposit_id(deposit)?;
    println!("{}", "Preparing claim...".cyan());

    let account = session.account()?;
    let keys = session.storage().unlock()?;
    let ledger = session.ledger()?;
    let grant = session.grant()?;

    let record = find_record(&ledger, &grant, &deposit_id).await?;
    let bundle = if record.ciphertext.is_empty() {
        ledger.fetch_ciphertext(&grant, record.index).await?
    } else {
        record.ciphertext.clone()
    };

    let protocol = &session.config.protocol;
    let engine = protocol.engine();
    let aad = protocol.aad_builder();
    let found = Scanner::new(&engine, &keys, account, &aad)
        .try_record(&record, &bundle)
        .map_err(|reason| anyhow!("Deposit 0x{} cannot be claimed: {}", hex::encode(deposit_id), reason))?;

    println!("Claiming {} to {}...", found.amount, found.recipient);
    let tx = submit_claim(&ledger, &grant, &record, &found)
        .await
        .context("Failed to submit claim")?;

    println!();
    println!("{}", "Deposit claimed successfully!".green().bold());
    println!();
    println!("Transaction: {}", tx);
    println!("Amount:      {}", found.amount);
    println!("Recipient:   {}", found.recipient);

    Ok(())
}

async fn find_record<S>(
    source: &S,
    grant: &stealth_deposit::AccessGrant,
    deposit_id: &DepositId,
) -> Result<DepositRecord>
where
    S: RecordSource + ?Sized,
{
    let records = source.list_records(grant, RecordRange::all()).await?;
    match records.into_iter().find(|r| &r.deposit_id == deposit_id) {
        Some(record) => Ok(record),
        None => bail!("No deposit with id 0x{}", hex::encode(deposit_id)),
    }
}
