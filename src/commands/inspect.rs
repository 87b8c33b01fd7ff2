//! `pgfixture inspect`: what a reset would touch.

use anyhow::Result;
use colored::Colorize;
use pgfixture::config::Config;
use pgfixture::connection::connect;
use pgfixture::introspect::{list_sequences, list_tables};
use serde_json::json;

use super::setup_ctrlc_handler;

pub async fn inspect(config: &Config, json: bool) -> Result<()> {
    let (client, connection) = connect(&config.database).await?;
    setup_ctrlc_handler(client.cancel_token());

    let sequences = list_sequences(&client).await?;
    let tables = list_tables(&client).await?;
    drop(client);
    let _ = connection.await;

    if json {
        let payload = json!({
            "database": config.database.to_string(),
            "sequences": sequences,
            "tables": tables,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{}", format!("Database {}", config.database).bold());

    println!("\n{} ({})", "Sequences".bold(), sequences.len());
    if sequences.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for seq in &sequences {
        println!("  {}", seq);
    }

    println!("\n{} ({})", "Tables".bold(), tables.len());
    if tables.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for table in &tables {
        println!("  {}", table);
    }

    Ok(())
}
