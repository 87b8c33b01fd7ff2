//! The application under test: a database handle plus an HTTP server.
//!
//! [`App`] owns both exclusively. [`App::start`] returns once the listener is
//! bound, so requests sent afterwards queue until the server accepts them.
//! [`App::stop`] shuts the server down gracefully and closes the database
//! connection; it is the only supported way to release an app.

use anyhow::{bail, Context, Result};
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_postgres::Client;
use tracing::{info, warn};

use crate::config::{Config, HttpConfig};
use crate::connection::connect;
use crate::routes::{self, RouteFactory};

/// State shared with request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Client>,
    /// Address the server is bound to.
    pub addr: SocketAddr,
}

/// A running axum server with a shutdown signal.
pub struct HttpServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl HttpServer {
    /// Serve `router` on an already bound listener.
    pub fn start(listener: TcpListener, router: Router) -> Result<Self> {
        let addr = listener
            .local_addr()
            .context("Failed to read listener address")?;
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
        });

        info!(%addr, "server listening");
        Ok(HttpServer {
            addr,
            shutdown: Some(tx),
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal shutdown and wait for in-flight requests, up to `timeout`.
    pub async fn stop(mut self, timeout: Duration) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(joined) => {
                joined
                    .context("server task panicked")?
                    .context("server exited with an error")?;
                info!(addr = %self.addr, "server stopped");
                Ok(())
            }
            Err(_) => {
                self.task.abort();
                bail!(
                    "server on {} did not shut down within {}ms",
                    self.addr,
                    timeout.as_millis()
                )
            }
        }
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            warn!(addr = %self.addr, "server dropped without stop; signalling shutdown");
            let _ = tx.send(());
        }
    }
}

/// Observes how an app was stopped, after the app itself is gone.
#[derive(Debug, Clone, Default)]
pub struct StopRecord {
    inner: Arc<StopState>,
}

#[derive(Debug, Default)]
struct StopState {
    calls: AtomicUsize,
    succeeded: AtomicBool,
}

impl StopRecord {
    /// How many times `stop` was called.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Whether the last `stop` call succeeded. False if never stopped.
    pub fn succeeded(&self) -> bool {
        self.inner.succeeded.load(Ordering::SeqCst)
    }

    fn record(&self, ok: bool) {
        self.inner.succeeded.store(ok, Ordering::SeqCst);
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct App {
    http: HttpConfig,
    database: String,
    db: Arc<Client>,
    connection: Option<JoinHandle<()>>,
    server: Option<HttpServer>,
    routes: RouteFactory,
    stops: StopRecord,
}

impl App {
    /// Connect to the configured database; serves the default routes.
    pub async fn new(config: &Config) -> Result<Self> {
        Self::with_routes(config, routes::router).await
    }

    pub async fn with_routes(config: &Config, routes: RouteFactory) -> Result<Self> {
        let (client, connection) = connect(&config.database).await?;
        Ok(App {
            http: config.http.clone(),
            database: config.database.to_string(),
            db: Arc::new(client),
            connection: Some(connection),
            server: None,
            routes,
            stops: StopRecord::default(),
        })
    }

    /// Bind the listener and start serving. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.server.is_some() {
            bail!("application already started");
        }
        if self.connection.is_none() {
            bail!("application already stopped");
        }

        let listener = TcpListener::bind(self.http.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.http.bind))?;
        let addr = listener
            .local_addr()
            .context("Failed to read listener address")?;

        let state = AppState {
            db: Arc::clone(&self.db),
            addr,
        };
        let server = HttpServer::start(listener, (self.routes)(state))?;
        info!(%addr, database = %self.database, "application started");
        self.server = Some(server);
        Ok(addr)
    }

    /// Live database handle.
    pub fn db(&self) -> &Client {
        &self.db
    }

    /// Shared database handle. Stopping the app closes the connection under
    /// every clone.
    pub fn db_handle(&self) -> Arc<Client> {
        Arc::clone(&self.db)
    }

    /// Bound address, once started.
    pub fn addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(HttpServer::addr)
    }

    pub fn stop_record(&self) -> StopRecord {
        self.stops.clone()
    }

    /// Stop the server (if started) and close the database connection.
    pub async fn stop(&mut self) -> Result<()> {
        let result = self.shutdown().await;
        self.stops.record(result.is_ok());
        result
    }

    async fn shutdown(&mut self) -> Result<()> {
        let connection = self
            .connection
            .take()
            .context("application already stopped")?;

        let served = match self.server.take() {
            Some(server) => server.stop(self.http.shutdown_timeout).await,
            None => Ok(()),
        };

        connection.abort();
        let _ = connection.await;
        info!(database = %self.database, "application stopped");

        served
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            warn!(database = %self.database, "application dropped without stop");
            connection.abort();
        }
    }
}
