//! Per-test database reset.
//!
//! Two phases, in order: restart every sequence at 1, then truncate every
//! base table with `CASCADE`. Each statement runs on its own (no wrapping
//! transaction) and the first failure aborts the reset, so a half-reset
//! database never reaches a test body silently.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_postgres::Client;
use tracing::debug;

use crate::introspect::{list_sequences, list_tables};
use crate::sql;

/// What one reset touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    pub sequences_restarted: usize,
    pub tables_truncated: usize,
}

impl ResetSummary {
    /// Number of statements executed besides the catalog queries.
    pub fn statements(&self) -> usize {
        self.sequences_restarted + self.tables_truncated
    }
}

/// Empty every table and restart every sequence, leaving the schema intact.
///
/// The catalog is read fresh on every call.
pub async fn reset_database(client: &Client) -> Result<ResetSummary> {
    let mut summary = ResetSummary::default();

    let sequences = list_sequences(client)
        .await
        .context("sequence reset: catalog query failed")?;
    for seq in &sequences {
        let stmt = sql::restart_sequence(&seq.schema, &seq.name);
        debug!(sql = %stmt, "restarting sequence");
        client
            .batch_execute(&stmt)
            .await
            .with_context(|| format!("sequence reset: failed to restart {}", seq))?;
        summary.sequences_restarted += 1;
    }

    let tables = list_tables(client)
        .await
        .context("table wipe: catalog query failed")?;
    for table in &tables {
        let stmt = sql::truncate_cascade(&table.schema, &table.name);
        debug!(sql = %stmt, "truncating table");
        client
            .batch_execute(&stmt)
            .await
            .with_context(|| format!("table wipe: failed to truncate {}", table))?;
        summary.tables_truncated += 1;
    }

    debug!(
        sequences = summary.sequences_restarted,
        tables = summary.tables_truncated,
        "database reset complete"
    );

    Ok(summary)
}
