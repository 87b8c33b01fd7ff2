//! Database connections for the fixtures.

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::config::DbConfig;

/// Connect to a database and spawn its connection driver.
///
/// The returned handle owns the socket: aborting it closes the connection
/// even while clones of the client are still alive.
pub async fn connect(config: &DbConfig) -> Result<(Client, JoinHandle<()>)> {
    let url = config.url()?;

    let (client, connection) =
        tokio::time::timeout(config.connect_timeout, tokio_postgres::connect(&url, NoTls))
            .await
            .with_context(|| {
                format!(
                    "Connection to {} timed out after {}ms",
                    config,
                    config.connect_timeout.as_millis()
                )
            })?
            .with_context(|| format!("Failed to connect to {}", config))?;

    let target = config.to_string();
    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(database = %target, error = %e, "database connection closed with error");
        }
    });

    Ok((client, driver))
}
