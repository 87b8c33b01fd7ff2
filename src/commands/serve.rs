//! `pgfixture serve`: run the app until Ctrl+C.

use anyhow::{Context, Result};
use colored::Colorize;
use pgfixture::config::Config;
use pgfixture::App;

pub async fn serve(config: &Config, quiet: bool) -> Result<()> {
    let mut app = App::new(config).await?;
    let addr = app.start().await?;

    if !quiet {
        println!(
            "{} on http://{} (database {}). Ctrl+C to stop.",
            "Serving".green(),
            addr,
            config.database
        );
    }

    let waited = tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C");
    let stopped = app.stop().await;

    waited?;
    stopped?;
    if !quiet {
        println!("Stopped.");
    }
    Ok(())
}
