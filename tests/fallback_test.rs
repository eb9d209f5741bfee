use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn script() -> tempfile::NamedTempFile {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        script,
        r#"{{"op": "create_order", "body": {{"product": {{"id": 1, "quantity": 1}}}}}}"#
    )
    .unwrap();
    script
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let script = script();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("--catalog")
        .arg("tests/fixtures/catalog.json")
        .arg("--db-path")
        .arg("some_db")
        .arg("run")
        .arg(script.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""status":302"#))
        .stderr(predicate::str::contains(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage.",
        ));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let script = script();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("--catalog")
        .arg("tests/fixtures/catalog.json")
        .arg("--db-path")
        .arg(&db_path)
        .arg("run")
        .arg(script.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not())
        .stderr(predicate::str::contains("Using RocksDB storage"));
}
