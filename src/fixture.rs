//! Suite setup and per-test fixtures.
//!
//! A test run has two levels:
//!
//! - **Suite** (once per process): load configuration, then bring the test
//!   database's schema up to date with the schema tool. Failure here is fatal
//!   to every test.
//! - **Fixture** (once per test): start an [`App`], reset its database, and
//!   hand the test an [`HttpClient`] bound to that app. Teardown stops the app
//!   and must run on every exit path.
//!
//! ```ignore
//! #[tokio::test]
//! async fn health_is_ok() {
//!     let suite = pgfixture::shared_suite();
//!     Fixture::run(suite, |fx| async move {
//!         let resp = fx.client.get("/health").await.unwrap();
//!         assert!(resp.status().is_success());
//!     })
//!     .await;
//! }
//! ```

use anyhow::{Context, Result};
use futures_util::FutureExt;
use std::ffi::OsString;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio_postgres::Client;
use tracing::{error, warn};

use crate::app::{App, StopRecord};
use crate::client::HttpClient;
use crate::config::Config;
use crate::reset::{reset_database, ResetSummary};
use crate::routes::{self, RouteFactory};
use crate::schema_sync::{sync_schema, CommandRunner, SchemaApply, SystemRunner};

/// Env var naming the dotenv file the suite loads.
pub const TEST_ENV_FILE: &str = "TEST_ENV_FILE";

/// Loaded when [`TEST_ENV_FILE`] is unset and the file exists.
pub const DEFAULT_TEST_ENV_FILE: &str = "env/test.env";

/// Configuration for a test run whose schema has been synced.
pub struct Suite {
    config: Config,
    routes: RouteFactory,
}

impl Suite {
    /// Load configuration from the environment (seeded from the test env
    /// file) and sync the schema with the real schema tool.
    pub fn from_env() -> Result<Self> {
        let env_file = test_env_file(std::env::var_os(TEST_ENV_FILE));
        let config =
            Config::load(env_file.as_deref()).context("Error loading test configuration")?;
        Self::init(config)
    }

    pub fn init(config: Config) -> Result<Self> {
        Self::init_with(config, &SystemRunner)
    }

    /// Sync the schema through `runner`, then hand back the suite.
    pub fn init_with(config: Config, runner: &dyn CommandRunner) -> Result<Self> {
        let apply = SchemaApply::from_config(&config)?;
        sync_schema(runner, &apply).context("Error setting up database")?;
        Ok(Suite {
            config,
            routes: routes::router,
        })
    }

    /// Serve `routes` instead of the default router in every fixture.
    pub fn with_routes(mut self, routes: RouteFactory) -> Self {
        self.routes = routes;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// The dotenv file the suite loads: the one named by [`TEST_ENV_FILE`] (which
/// must then exist), else [`DEFAULT_TEST_ENV_FILE`] if present.
fn test_env_file(named: Option<OsString>) -> Option<PathBuf> {
    match named {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let path = PathBuf::from(DEFAULT_TEST_ENV_FILE);
            path.exists().then_some(path)
        }
    }
}

static SHARED_SUITE: OnceLock<Result<Suite, String>> = OnceLock::new();

/// The process-wide suite, initialized by the first test that asks.
///
/// Concurrent callers block until initialization finishes, so the schema is
/// synced before any fixture starts. A failed initialization is logged once
/// and remembered: every test that calls this panics before its body runs.
pub fn shared_suite() -> &'static Suite {
    let outcome = SHARED_SUITE.get_or_init(|| {
        Suite::from_env().map_err(|e| {
            let msg = format!("{:#}", e);
            error!(error = %msg, "test suite setup failed");
            msg
        })
    });

    match outcome {
        Ok(suite) => suite,
        Err(msg) => panic!("test suite setup failed: {}", msg),
    }
}

/// What a test body gets: cheap clones of the fixture's resources.
#[derive(Clone)]
pub struct FixtureHandle {
    pub client: HttpClient,
    pub db: Arc<Client>,
    pub addr: SocketAddr,
    pub stops: StopRecord,
}

/// One running app with a clean database and a client bound to it.
pub struct Fixture {
    app: App,
    client: HttpClient,
    addr: SocketAddr,
    reset: ResetSummary,
}

impl Fixture {
    /// Start an app, reset its database, and bind a client to it.
    ///
    /// The caller owns teardown: call [`Fixture::cleanup`] on every exit
    /// path, or use [`Fixture::run`] which does it for you.
    pub async fn setup(suite: &Suite) -> Result<Self> {
        Self::setup_with_routes(suite, suite.routes).await
    }

    pub async fn setup_with_routes(suite: &Suite, routes: RouteFactory) -> Result<Self> {
        let mut app = App::with_routes(&suite.config, routes)
            .await
            .context("Failed to create application")?;

        let addr = match app.start().await {
            Ok(addr) => addr,
            Err(e) => return Err(abandon(app, e.context("Failed to start application")).await),
        };

        let reset = match reset_database(app.db()).await {
            Ok(summary) => summary,
            Err(e) => return Err(abandon(app, e.context("Failed to reset test database")).await),
        };

        let client = match HttpClient::for_addr(addr) {
            Ok(client) => client,
            Err(e) => return Err(abandon(app, e).await),
        };

        Ok(Fixture {
            app,
            client,
            addr,
            reset,
        })
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn db(&self) -> &Client {
        self.app.db()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// What the setup reset touched.
    pub fn reset_summary(&self) -> ResetSummary {
        self.reset
    }

    pub fn stop_record(&self) -> StopRecord {
        self.app.stop_record()
    }

    pub fn handle(&self) -> FixtureHandle {
        FixtureHandle {
            client: self.client.clone(),
            db: self.app.db_handle(),
            addr: self.addr,
            stops: self.app.stop_record(),
        }
    }

    /// Stop the app, releasing its server and database connection.
    pub async fn cleanup(mut self) -> Result<()> {
        self.app.stop().await.context("Failed to stop application")
    }

    /// Set up a fixture, run `body`, and tear the fixture down exactly once
    /// whether `body` returns or panics.
    ///
    /// Setup failures panic before `body` runs. A panic in `body` is resumed
    /// after teardown. A teardown failure after a passing body panics, so the
    /// test fails while the rest of the run continues.
    pub async fn run<F, Fut, T>(suite: &Suite, body: F) -> T
    where
        F: FnOnce(FixtureHandle) -> Fut,
        Fut: Future<Output = T>,
    {
        let fixture = match Fixture::setup(suite).await {
            Ok(fixture) => fixture,
            Err(e) => panic!("fixture setup failed: {:#}", e),
        };
        let handle = fixture.handle();
        run_guarded(async move { body(handle).await }, fixture.cleanup()).await
    }
}

/// Stop a half-built app and return the error that stopped the setup.
async fn abandon(mut app: App, err: anyhow::Error) -> anyhow::Error {
    if let Err(stop_err) = app.stop().await {
        warn!(error = %format!("{:#}", stop_err), "failed to stop application after setup error");
    }
    err
}

/// Await `body`, then `teardown`, no matter how `body` ends.
async fn run_guarded<T, B, C>(body: B, teardown: C) -> T
where
    B: Future<Output = T>,
    C: Future<Output = Result<()>>,
{
    let outcome = AssertUnwindSafe(body).catch_unwind().await;
    let stopped = teardown.await;

    match outcome {
        Ok(value) => {
            if let Err(e) = stopped {
                panic!("fixture teardown failed: {:#}", e);
            }
            value
        }
        Err(panic) => {
            if let Err(e) = stopped {
                error!(error = %format!("{:#}", e), "fixture teardown failed after test panic");
            }
            std::panic::resume_unwind(panic)
        }
    }
}
