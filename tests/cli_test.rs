use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;
use std::process::Command;

const CATALOG: &str = "tests/fixtures/catalog.json";

fn replies(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_cli_checkout() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("--catalog")
        .arg(CATALOG)
        .arg("run")
        .arg("tests/fixtures/checkout.jsonl");

    let output = cmd.output()?;
    assert!(output.status.success());
    let replies = replies(&output.stdout);
    assert_eq!(replies.len(), 5);

    assert_eq!(replies[0]["status"], 302);
    assert_eq!(replies[0]["body"]["location"], "/order/1");
    assert_eq!(replies[1]["status"], 200);
    assert_eq!(replies[1]["body"]["order"]["email"], "jgnault@example.com");
    assert_eq!(replies[2]["status"], 202);
    assert_eq!(replies[3]["body"]["paid"], 1);

    let order = &replies[4]["body"]["order"];
    assert_eq!(replies[4]["status"], 200);
    assert_eq!(order["paid"], true);
    assert_eq!(order["total_price"].as_f64(), Some(40.0));
    assert_eq!(order["shipping_price"].as_f64(), Some(5.0));
    assert_eq!(order["transaction"]["success"], true);
    assert_eq!(order["transaction"]["amount_charged"].as_f64(), Some(45.0));
    assert_eq!(order["credit_card"]["first_digits"], "4242");
    assert!(order["transaction"]["error"].as_object().unwrap().is_empty());

    Ok(())
}

#[test]
fn test_cli_rejections() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("--catalog")
        .arg(CATALOG)
        .arg("run")
        .arg("tests/fixtures/rejections.jsonl");

    let output = cmd.output()?;
    assert!(output.status.success());
    let replies = replies(&output.stdout);
    assert_eq!(replies.len(), 11);

    let error = |i: usize, scope: &str| {
        (
            replies[i]["status"].as_u64().unwrap(),
            replies[i]["body"]["errors"][scope]["code"]
                .as_str()
                .unwrap()
                .to_string(),
        )
    };
    assert_eq!(error(0, "product"), (404, "product-does-not-exist".into()));
    assert_eq!(error(1, "product"), (422, "out-of-inventory".into()));
    assert_eq!(error(2, "order"), (422, "missing-fields".into()));
    assert_eq!(error(3, "order"), (404, "order-not-found".into()));
    assert_eq!(error(4, "order"), (422, "json-not-valid".into()));

    // Rejected creations do not consume identifiers.
    assert_eq!(replies[5]["status"], 302);
    assert_eq!(replies[5]["body"]["order_id"], 1);

    assert_eq!(error(6, "credit_card"), (422, "json-not-valid".into()));
    assert_eq!(replies[7]["status"], 202);
    assert_eq!(error(8, "order"), (409, "order-pending".into()));
    assert_eq!(replies[9]["body"]["failed"], 1);

    let order = &replies[10]["body"]["order"];
    assert_eq!(order["paid"], false);
    assert_eq!(order["transaction"]["success"], false);
    assert_eq!(order["transaction"]["error"]["code"], "missing-fields");
    assert!(order["shipping_info"].as_object().unwrap().is_empty());

    Ok(())
}

#[test]
fn test_cli_work_on_empty_queue() {
    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("work");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""executed":0"#));
}

#[test]
fn test_cli_missing_script_fails() {
    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("run").arg("tests/fixtures/does-not-exist.jsonl");

    cmd.assert().failure();
}

#[test]
fn test_cli_replies_keep_card_number_out_of_stdout_and_logs() {
    let mut script = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        script,
        r#"{{"op": "create_order", "body": {{"product": {{"id": 1, "quantity": 1}}}}}}"#
    )
    .unwrap();
    writeln!(
        script,
        r#"{{"op": "update_order", "id": 1, "body": {{"credit_card": {{"name": "John Doe", "number": "4242 4242 4242 4242", "expiration_year": 2030, "cvv": "123", "expiration_month": 9}}}}}}"#
    )
    .unwrap();
    writeln!(script, r#"{{"op": "process_payments"}}"#).unwrap();
    writeln!(script, r#"{{"op": "get_order", "id": 1}}"#).unwrap();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.env("RUST_LOG", "debug")
        .arg("--catalog")
        .arg(CATALOG)
        .arg("run")
        .arg(script.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("4242 4242 4242 4242").not())
        .stdout(predicate::str::contains(r#""cvv""#).not())
        .stderr(predicate::str::contains("4242 4242 4242 4242").not());
}
