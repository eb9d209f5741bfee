#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const CATALOG: &str = "tests/fixtures/catalog.json";

fn run_script(db_path: &Path, lines: &[&str]) -> Vec<Value> {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(script, "{}", line).unwrap();
    }

    let output = Command::new(cargo_bin!("orderflow"))
        .arg("--catalog")
        .arg(CATALOG)
        .arg("--db-path")
        .arg(db_path)
        .arg("run")
        .arg(script.path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: create the order and queue its payment
    let replies = run_script(
        &db_path,
        &[
            r#"{"op": "create_order", "body": {"product": {"id": 1, "quantity": 2}}}"#,
            r#"{"op": "update_order", "id": 1, "body": {"order": {"email": "jdoe@example.com", "shipping_information": {"country": "Canada", "address": "201, rue Président-Kennedy", "postal_code": "G7X 3Y7", "city": "Chicoutimi", "province": "QC"}}}}"#,
            r#"{"op": "update_order", "id": 1, "body": {"credit_card": {"name": "John Doe", "number": "4242 4242 4242 4242", "expiration_year": 2030, "cvv": "123", "expiration_month": 9}}}"#,
        ],
    );
    assert_eq!(replies[0]["status"], 302);
    assert_eq!(replies[2]["status"], 202);

    // 2. Worker run over the same database picks up the queued job
    let output = Command::new(cargo_bin!("orderflow"))
        .arg("--catalog")
        .arg(CATALOG)
        .arg("--db-path")
        .arg(&db_path)
        .arg("work")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["paid"], 1);

    // 3. Third run: the order is paid and new orders continue the id sequence
    let replies = run_script(
        &db_path,
        &[
            r#"{"op": "get_order", "id": 1}"#,
            r#"{"op": "create_order", "body": {"product": {"id": 2, "quantity": 1}}}"#,
        ],
    );
    let order = &replies[0]["body"]["order"];
    assert_eq!(order["paid"], true);
    assert_eq!(order["transaction"]["amount_charged"].as_f64(), Some(45.0));
    assert_eq!(replies[1]["body"]["order_id"], 2);
}
