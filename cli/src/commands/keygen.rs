//! Key generation command with encrypted storage and mnemonic support

use anyhow::{bail, Result};
use colored::Colorize;
use stealth_deposit::KeyPair;

use super::Session;
use crate::secure_storage::prompt_new_password;

pub struct KeygenOptions {
    /// Overwrite an existing key file
    pub force: bool,
    /// Derive the key from a fresh recovery phrase
    pub with_mnemonic: bool,
    pub import_mnemonic: Option<String>,
    /// Optional BIP-39 passphrase
    pub passphrase: Option<String>,
}

pub fn run(session: &Session, options: KeygenOptions) -> Result<()> {
    let storage = session.storage();

    if storage.exists() && !options.force {
        bail!(
            "A recipient key already exists. Use --force to overwrite.\n\
             Warning: deposits sealed to the old key will no longer be discoverable!"
        );
    }

    println!("{}", "=== Stealth Deposit Key Generation ===".cyan().bold());
    println!();

    let (keys, mnemonic) = if let Some(ref phrase) = options.import_mnemonic {
        println!("{}", "Importing key from mnemonic phrase...".cyan());
        let passphrase = options.passphrase.as_deref().unwrap_or("");
        (KeyPair::from_mnemonic(phrase, passphrase)?, None)
    } else if options.with_mnemonic {
        println!("{}", "Generating key with recovery phrase...".cyan());
        let (keys, phrase) = KeyPair::generate_with_mnemonic()?;
        (keys, Some(phrase))
    } else {
        println!("{}", "Generating random key (no recovery phrase)...".cyan());
        println!(
            "{}",
            "Warning: Without a recovery phrase, losing your password means losing access to deposits!"
                .yellow()
        );
        println!();
        (KeyPair::generate()?, None)
    };
    let recoverable = mnemonic.is_some() || options.import_mnemonic.is_some();

    println!();
    println!("{}", "Choose a strong password to encrypt your key.".cyan());
    println!("{}", "Requirements: 8+ chars, uppercase, lowercase, and numbers".dimmed());
    println!();

    let password = prompt_new_password("Enter password: ")?;
    storage.save(&keys, &password, recoverable)?;

    println!();
    println!("{}", "Key generated and encrypted successfully!".green().bold());
    println!();

    if let Some(ref phrase) = mnemonic {
        print_recovery_phrase(phrase);
    }

    println!("{}:", "Recipient Public Key".yellow());
    println!("  {}", keys.public_key());
    println!();
    println!(
        "{}",
        format!("Encrypted key saved to: {}", storage.path().display()).dimmed()
    );
    println!(
        "{}",
        "Run 'stealthdep register' to publish the key for your account.".dimmed()
    );

    if !recoverable {
        println!();
        println!("{}", "IMPORTANT: You did not use a recovery phrase.".red().bold());
        println!("{}", "If you lose your password, pending deposits are PERMANENTLY LOST.".red());
    }

    Ok(())
}

fn print_recovery_phrase(phrase: &str) {
    println!("{}", "=== RECOVERY PHRASE - WRITE THIS DOWN! ===".red().bold());
    println!();
    println!("{}", "┌────────────────────────────────────────────────────────────┐".yellow());

    let words: Vec<&str> = phrase.split_whitespace().collect();
    for (i, chunk) in words.chunks(4).enumerate() {
        let line: String = chunk
            .iter()
            .enumerate()
            .map(|(j, word)| format!("{:2}. {:<12}", i * 4 + j + 1, word))
            .collect::<Vec<_>>()
            .join(" ");
        println!("│ {} │", format!("{:<58}", line).yellow());
    }

    println!("{}", "└────────────────────────────────────────────────────────────┘".yellow());
    println!();
    println!("{}", "CRITICAL: Store this phrase securely OFFLINE!".red().bold());
    println!("{}", "You will NOT be shown this phrase again.".red());
    println!();
}
