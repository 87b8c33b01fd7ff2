//! Catalog inspection for the reset service.
//!
//! Both queries read `information_schema` and skip the system schemas. The
//! exclusion list is bound as a `text[]` parameter so each schema is its own
//! element; a single `'information_schema, pg_catalog'` literal would match
//! neither schema.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use tokio_postgres::Client;

use crate::sql::qualified;

/// Schemas that belong to PostgreSQL itself.
pub const SYSTEM_SCHEMAS: [&str; 2] = ["information_schema", "pg_catalog"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub schema: String,
    pub name: String,
}

/// A base table (never a view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub schema: String,
    pub name: String,
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&qualified(&self.schema, &self.name))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&qualified(&self.schema, &self.name))
    }
}

/// List every sequence outside the system schemas, including the ones
/// backing identity columns.
pub async fn list_sequences(client: &Client) -> Result<Vec<Sequence>> {
    // information_schema.sequences hides identity sequences; pg_sequences doesn't.
    // Columns are `name`; cast so they decode as String.
    let query = r#"
        SELECT schemaname::text AS schema, sequencename::text AS name
        FROM pg_catalog.pg_sequences
        WHERE schemaname::text <> ALL($1::text[])
        ORDER BY schemaname, sequencename
    "#;

    let excluded: &[&str] = &SYSTEM_SCHEMAS;
    let rows = client
        .query(query, &[&excluded])
        .await
        .context("Failed to list sequences")?;

    Ok(rows
        .iter()
        .map(|row| Sequence {
            schema: row.get("schema"),
            name: row.get("name"),
        })
        .collect())
}

/// List every base table outside the system schemas.
pub async fn list_tables(client: &Client) -> Result<Vec<Table>> {
    let query = r#"
        SELECT table_schema::text AS schema, table_name::text AS name
        FROM information_schema.tables
        WHERE table_schema <> ALL($1::text[])
          AND table_type = 'BASE TABLE'
        ORDER BY table_schema, table_name
    "#;

    let excluded: &[&str] = &SYSTEM_SCHEMAS;
    let rows = client
        .query(query, &[&excluded])
        .await
        .context("Failed to list tables")?;

    Ok(rows
        .iter()
        .map(|row| Table {
            schema: row.get("schema"),
            name: row.get("name"),
        })
        .collect())
}
