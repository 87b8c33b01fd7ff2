//! Suite setup and the per-test fixture lifecycle against a real PostgreSQL.

use crate::common::{InSyncRunner, TestDatabase};
use futures_util::FutureExt;
use pgfixture::{Config, Fixture, HttpClient, StopRecord, Suite};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

fn suite_for(db: &TestDatabase) -> Suite {
    Suite::init_with(db.config(), &InSyncRunner).expect("suite setup")
}

#[tokio::test]
async fn test_run_resets_database_before_body() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    db.run_sql_ok(
        "CREATE TABLE orders (id SERIAL PRIMARY KEY, item TEXT);
         INSERT INTO orders (item) VALUES ('left over'), ('from before');",
    );
    let suite = suite_for(&db);

    let ids = Fixture::run(&suite, |fx| async move {
        let rows = fx
            .db
            .query("SELECT count(*) FROM orders", &[])
            .await
            .unwrap();
        let count: i64 = rows[0].get(0);
        assert_eq!(count, 0);

        let row = fx
            .db
            .query_one("INSERT INTO orders (item) VALUES ('fresh') RETURNING id", &[])
            .await
            .unwrap();
        row.get::<_, i32>(0)
    })
    .await;

    assert_eq!(ids, 1);
}

#[tokio::test]
async fn test_health_endpoint_reports_its_address() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let suite = suite_for(&db);

    Fixture::run(&suite, |fx| async move {
        let resp = fx.client.get("/health").await.unwrap();
        assert!(resp.status().is_success());
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["addr"], fx.addr.to_string());
    })
    .await;
}

#[tokio::test]
async fn test_teardown_runs_once_when_body_panics() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let suite = suite_for(&db);
    let captured: Arc<Mutex<Option<StopRecord>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&captured);

    let result = AssertUnwindSafe(Fixture::run(&suite, |fx| async move {
        *slot.lock().unwrap() = Some(fx.stops.clone());
        assert_eq!(fx.stops.calls(), 0);
        panic!("test body assertion failed");
    }))
    .catch_unwind()
    .await;

    assert!(result.is_err(), "body panic must reach the test");
    let stops = captured.lock().unwrap().take().expect("body ran");
    assert_eq!(stops.calls(), 1);
    assert!(stops.succeeded());
}

#[tokio::test]
async fn test_concurrent_fixtures_are_isolated() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let suite = suite_for(&db);

    let (first, second) = tokio::join!(Fixture::setup(&suite), Fixture::setup(&suite));
    let first = first.unwrap();
    let second = second.unwrap();
    assert_ne!(first.addr(), second.addr());

    for fixture in [&first, &second] {
        let body: Value = fixture
            .client()
            .get("/health")
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["addr"], fixture.addr().to_string());
    }

    first.cleanup().await.unwrap();

    // Stopping one app leaves the other serving.
    let resp = second.client().get("/health").await.unwrap();
    assert!(resp.status().is_success());
    second.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_requests_fail_after_cleanup() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    let suite = suite_for(&db);

    let fixture = Fixture::setup(&suite).await.unwrap();
    let addr = fixture.addr();
    let stops = fixture.stop_record();
    fixture.cleanup().await.unwrap();

    assert_eq!(stops.calls(), 1);
    let client = HttpClient::for_addr(addr).unwrap();
    assert!(client.get("/health").await.is_err());
}

#[tokio::test]
async fn test_setup_fails_when_database_unreachable() {
    // Reserve a port, then free it so nothing is listening there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config::from_lookup(|key| match key {
        "DB_HOST" => Some("127.0.0.1".into()),
        "DB_PORT" => Some(port.to_string()),
        "DB_USER" => Some("app".into()),
        "DB_NAME" => Some("app_test".into()),
        "DB_CONNECT_TIMEOUT" => Some("2s".into()),
        _ => None,
    })
    .unwrap();
    let suite = Suite::init_with(config, &InSyncRunner).unwrap();

    let err = Fixture::setup(&suite).await.err().expect("setup must fail");
    let msg = format!("{:#}", err);
    assert!(msg.contains("Failed to create application"), "{}", msg);
}
