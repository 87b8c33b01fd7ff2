//! Exit code policy for the pgfixture CLI.
//!
//! - `0` = Success
//! - `10` = General operational failure (connection lost, statement failed)
//! - `12` = Configuration error (missing or invalid environment)
//! - `14` = Schema sync failed (the schema tool exited non-zero)
//! - `130` = Interrupted by Ctrl+C

/// Exit code: general operational failure
pub const OPERATIONAL_FAILURE: i32 = 10;

/// Exit code: configuration error
pub const CONFIG_ERROR: i32 = 12;

/// Exit code: schema tool failure
pub const SCHEMA_SYNC_FAILURE: i32 = 14;

/// Exit code: interrupted by Ctrl+C (SIGINT)
pub const INTERRUPTED: i32 = 130;
