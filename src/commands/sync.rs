//! `pgfixture sync`: run `schema apply` against the configured database.

use anyhow::Result;
use colored::Colorize;
use pgfixture::config::Config;
use pgfixture::{sync_schema, SchemaApply, SystemRunner};

pub fn sync(config: &Config, quiet: bool, verbose: bool) -> Result<()> {
    let apply = SchemaApply::from_config(config)?;

    if !quiet {
        println!(
            "Applying {} to {} with {}...",
            config.schema.dir.join(&config.schema.file).display(),
            config.database,
            config.schema.tool
        );
    }

    let output = sync_schema(&SystemRunner, &apply)?;

    if verbose && !output.trim().is_empty() {
        println!("{}", output.trim_end());
    }
    if !quiet {
        println!("{}", "Schema is in sync.".green());
    }

    Ok(())
}
