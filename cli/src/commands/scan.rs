//! Scan the ledger for deposits addressed to us

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use colored::Colorize;
use stealth_deposit::{DecryptedMatch, RecordRange, ScanCancel, ScanReport, Scanner};
use tracing::warn;

use super::Session;

pub async fn run(session: &Session, from: u64, limit: Option<u64>) -> Result<()> {
    println!("{}", "Scanning for incoming stealth deposits...".cyan());

    let account = session.account()?;
    let keys = session.storage().unlock()?;
    let ledger = session.ledger()?;
    let grant = session.grant()?;

    let protocol = &session.config.protocol;
    let engine = protocol.engine();
    let aad = protocol.aad_builder();
    let scanner =
        Scanner::new(&engine, &keys, account, &aad).with_concurrency(protocol.scan_concurrency);

    // Ctrl-C stops at the next record boundary and reports where to resume
    let cancel = ScanCancel::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let range = RecordRange { start: from, limit };
    let report = scanner
        .scan_ledger(&ledger, &grant, range, &cancel)
        .await
        .context("Scan failed")?;
    watcher.abort();

    print_report(&report);
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!();
    println!(
        "{}",
        format!(
            "Examined {} record(s), skipped {} claimed",
            report.examined, report.skipped_claimed
        )
        .dimmed()
    );

    if report.matches.is_empty() {
        println!("{}", "No incoming deposits found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} deposit(s):", report.matches.len()).green().bold()
        );
        println!();

        for (i, found) in report.matches.iter().enumerate() {
            print_match(i + 1, found);
        }

        let total: u128 = report.matches.iter().map(|m| m.amount).sum();
        println!("{}", format!("Total claimable: {}", total).green().bold());
        println!();
        println!(
            "{}",
            "Use 'stealthdep claim --deposit <id>' to claim a deposit.".dimmed()
        );
    }

    if report.interrupted {
        if let Some(next) = report.resume_from {
            println!();
            println!(
                "{}",
                format!("Scan interrupted. Resume with 'stealthdep scan --from {}'.", next).yellow()
            );
        }
    }
}

fn print_match(n: usize, found: &DecryptedMatch) {
    if !found.commitment_ok {
        warn!(index = found.index, "decrypted secret does not open the commitment");
    }
    let status = if found.commitment_ok {
        "CLAIMABLE".green()
    } else {
        "COMMITMENT MISMATCH".red()
    };

    let when = Utc
        .timestamp_opt(found.created_at as i64, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| found.created_at.to_string());

    println!("{}. {} [{}]", n, "Deposit".yellow(), status);
    println!("   Id:      0x{}", hex::encode(found.deposit_id));
    println!("   Index:   {}", found.index);
    println!("   Amount:  {}", found.amount);
    println!("   Created: {}", when);
    println!();
}
