//! The `pgfixture` binary: exit codes, sync, inspect, and reset.

use crate::common::{run_pgfixture, stderr, stdout, TestDatabase};
use serde_json::Value;

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_missing_config_exits_with_config_error() {
    let output = run_pgfixture(&["inspect"], &[]);
    assert_eq!(output.status.code(), Some(12), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("DB_USER"), "{}", stderr(&output));
}

#[test]
fn test_missing_env_file_exits_with_config_error() {
    let output = run_pgfixture(
        &["--env-file", "/nonexistent/pgfixture/test.env", "inspect"],
        &vars(&[("DB_USER", "app"), ("DB_NAME", "app_test")]),
    );
    assert_eq!(output.status.code(), Some(12), "stderr: {}", stderr(&output));
}

#[cfg(unix)]
mod sync {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn fake_tool(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-atlas");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn env_for(dir: &Path, tool: &str) -> Vec<(String, String)> {
        vars(&[
            ("DB_USER", "app"),
            ("DB_NAME", "app_test"),
            ("SCHEMA_TOOL", tool),
            ("SCHEMA_DIR", &dir.to_string_lossy()),
        ])
    }

    #[test]
    fn test_sync_failure_exits_with_schema_sync_code() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "echo 'Error: relation \"orders\" already exists' >&2\nexit 1",
        );

        let output = run_pgfixture(&["sync"], &env_for(dir.path(), &tool));
        let err = stderr(&output);

        assert_eq!(output.status.code(), Some(14), "stderr: {}", err);
        assert!(err.contains("schema apply"), "{}", err);
        assert!(err.contains("exit status: 1"), "{}", err);
        assert!(err.contains("relation \"orders\" already exists"), "{}", err);
    }

    #[test]
    fn test_sync_success_passes_apply_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "echo \"$@\" > args.txt\necho 'Schema is synced'");

        let output = run_pgfixture(&["sync"], &env_for(dir.path(), &tool));
        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("Schema is in sync"));

        // The tool runs inside SCHEMA_DIR.
        let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
        assert!(args.starts_with("schema apply --to file://schema.sql"), "{}", args);
        assert!(args.contains("--dev-url"), "{}", args);
        assert!(args.trim_end().ends_with("--auto-approve"), "{}", args);
    }
}

#[test]
fn test_inspect_json_lists_tables() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    db.run_sql_ok("CREATE TABLE orders (id SERIAL PRIMARY KEY)");

    let output = run_pgfixture(&["inspect", "--json"], &db.env());
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let payload: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(payload["tables"][0]["schema"], "public");
    assert_eq!(payload["tables"][0]["name"], "orders");
    assert_eq!(payload["sequences"][0]["name"], "orders_id_seq");
}

#[test]
fn test_reset_requires_yes_when_not_interactive() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    db.run_sql_ok("CREATE TABLE orders (id SERIAL PRIMARY KEY); INSERT INTO orders DEFAULT VALUES;");

    let output = run_pgfixture(&["reset"], &db.env());
    assert_eq!(output.status.code(), Some(10), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("--yes"), "{}", stderr(&output));
    assert_eq!(db.count("orders"), 1);
}

#[test]
fn test_reset_yes_empties_tables() {
    skip_if_no_db!();
    let db = TestDatabase::new();
    db.run_sql_ok(
        "CREATE TABLE orders (id SERIAL PRIMARY KEY);
         INSERT INTO orders DEFAULT VALUES;
         INSERT INTO orders DEFAULT VALUES;",
    );

    let output = run_pgfixture(&["reset", "--yes"], &db.env());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("truncated 1 table(s)"), "{}", stdout(&output));
    assert_eq!(db.count("orders"), 0);
}
