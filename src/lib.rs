//! Integration-test fixtures for Postgres-backed web apps.
//!
//! - [`fixture`]: suite setup (config + schema sync) and per-test fixtures
//! - [`reset`]: empty every table and restart every sequence between tests
//! - [`introspect`]: catalog queries the reset is driven by
//! - [`schema_sync`]: `schema apply` through an external schema tool
//! - [`app`]: the application under test (database handle + HTTP server)

pub mod app;
pub mod client;
pub mod config;
pub mod connection;
pub mod fixture;
pub mod introspect;
pub mod redact;
pub mod reset;
pub mod routes;
pub mod schema_sync;
pub mod sql;

pub use app::{App, AppState, HttpServer, StopRecord};
pub use client::HttpClient;
pub use config::{Config, DbConfig};
pub use fixture::{shared_suite, Fixture, FixtureHandle, Suite};
pub use reset::{reset_database, ResetSummary};
pub use schema_sync::{sync_schema, CommandRunner, SchemaApply, SystemRunner};
