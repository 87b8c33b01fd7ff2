//! `pgfixture reset`: wipe the configured database outside a test run.

use anyhow::{bail, Result};
use colored::Colorize;
use dialoguer::Confirm;
use pgfixture::config::Config;
use pgfixture::connection::connect;
use pgfixture::reset_database;
use std::io::IsTerminal;

use super::setup_ctrlc_handler;

pub async fn reset(config: &Config, yes: bool, quiet: bool) -> Result<()> {
    if !yes {
        if !std::io::stdin().is_terminal() {
            bail!("Reset requires --yes flag to confirm when not running interactively.");
        }

        let proceed = Confirm::new()
            .with_prompt(format!(
                "Delete every row and restart every sequence in {}?",
                config.database
            ))
            .default(false)
            .interact()?;

        if !proceed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let (client, connection) = connect(&config.database).await?;
    setup_ctrlc_handler(client.cancel_token());

    let summary = reset_database(&client).await?;
    drop(client);
    let _ = connection.await;

    if !quiet {
        println!(
            "{}",
            format!(
                "Reset {}: restarted {} sequence(s), truncated {} table(s)",
                config.database, summary.sequences_restarted, summary.tables_truncated
            )
            .green()
        );
    }

    Ok(())
}
