//! Command implementations for the pgfixture CLI.

mod inspect;
mod reset;
mod serve;
mod sync;

pub use inspect::inspect;
pub use reset::reset;
pub use serve::serve;
pub use sync::sync;

use tokio_postgres::{CancelToken, NoTls};

use crate::exit_codes;

/// Cancel the running query and exit on Ctrl+C.
fn setup_ctrlc_handler(cancel_token: CancelToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        eprintln!("\nInterrupted (Ctrl+C). Cancelling query...");

        // Best effort: the query may already have finished.
        if let Err(e) = cancel_token.cancel_query(NoTls).await {
            eprintln!("Warning: Failed to cancel query: {}", e);
        }

        std::process::exit(exit_codes::INTERRUPTED);
    });
}
