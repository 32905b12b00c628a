//! Integration tests for the `tabfit train` command.

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

const DB_VARS: [&str; 7] = [
    "DB_USER",
    "DB_PASSWORD",
    "DB_HOST",
    "DB_PORT",
    "DB_NAME",
    "DB_PREDICTION_TABLE",
    "DB_PREDICTION_SCHEMA",
];

fn tabfit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tabfit").unwrap();
    cmd.current_dir(dir).env_remove("TABFIT_TARGET").env_remove("TABFIT_MODEL_DIR");
    for var in DB_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn seed(dir: &Path) {
    let conn = Connection::open(dir.join("warehouse.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE sales (price REAL, units INTEGER, promo INTEGER, total_sales REAL);
         INSERT INTO sales VALUES (9.5, 10, 0, 95.0);
         INSERT INTO sales VALUES (10.0, 13, 1, 130.0);
         INSERT INTO sales VALUES (12.0, 8, 0, 96.0);",
    )
    .unwrap();
    std::fs::write(dir.join("train-sales.sql"), "SELECT * FROM sales").unwrap();
}

#[test]
fn test_train_without_script_shows_usage() {
    let temp_dir = TempDir::new().unwrap();

    tabfit(temp_dir.path()).arg("train").assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_no_subcommand_shows_usage() {
    let temp_dir = TempDir::new().unwrap();

    tabfit(temp_dir.path()).assert().failure().stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_train_missing_script() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    tabfit(temp_dir.path())
        .env("DB_NAME", "warehouse.db")
        .arg("train")
        .arg("train-missing.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_train_requires_db_name() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    tabfit(temp_dir.path())
        .arg("train")
        .arg("train-sales.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DB_NAME"));
}

#[test]
fn test_train_rejects_invalid_port() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    tabfit(temp_dir.path())
        .env("DB_NAME", "warehouse.db")
        .env("DB_PORT", "not-a-port")
        .arg("train")
        .arg("train-sales.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DB_PORT"));
}

#[test]
fn test_train_saves_artifact() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    tabfit(temp_dir.path())
        .env("DB_NAME", "warehouse.db")
        .arg("train")
        .arg("train-sales.sql")
        .assert()
        .success()
        .stdout(predicate::str::contains("Training complete"))
        .stdout(predicate::str::contains("model-sales.pkl"));

    assert!(temp_dir.path().join("models/model-sales.pkl").exists());
}

#[test]
fn test_train_json_report() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    let output = tabfit(temp_dir.path())
        .env("DB_NAME", "warehouse.db")
        .arg("train")
        .arg("train-sales.sql")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["rows"], 3);
    assert_eq!(report["target"], "total_sales");
    assert_eq!(report["feature_names"], serde_json::json!(["price", "units", "promo"]));
}

#[test]
fn test_train_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());
    std::fs::write(
        temp_dir.path().join("tabfit.toml"),
        "[database]\nname = \"warehouse.db\"\n\n[training]\nmodel_dir = \"artifacts\"\n",
    )
    .unwrap();

    tabfit(temp_dir.path()).arg("train").arg("train-sales.sql").assert().success();

    assert!(temp_dir.path().join("artifacts/model-sales.pkl").exists());
}

#[test]
fn test_train_unknown_target_fails() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path());

    tabfit(temp_dir.path())
        .env("DB_NAME", "warehouse.db")
        .env("TABFIT_TARGET", "revenue")
        .arg("train")
        .arg("train-sales.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("revenue"));

    assert!(!temp_dir.path().join("models/model-sales.pkl").exists());
}
