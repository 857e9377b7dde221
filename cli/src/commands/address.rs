//! Display the recipient public key and account

use anyhow::Result;
use colored::Colorize;

use super::Session;

pub fn run(session: &Session) -> Result<()> {
    let stored = session.storage().read()?;
    let public_key = stored.public_key()?;

    println!();
    println!("{}", "Your Recipient Key".yellow().bold());
    println!();
    println!("{}", public_key);
    println!();
    match session.account() {
        Ok(account) => println!("  Account: {}", account),
        Err(_) => println!("  Account: {}", "not configured".dimmed()),
    }
    println!("  Created: {}", stored.created_at);
    println!();
    println!(
        "{}",
        "Senders look this key up by your account once it is registered.".dimmed()
    );

    Ok(())
}
