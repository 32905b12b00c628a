//! Integration tests for the `tabfit predict` command.

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

fn tabfit(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tabfit").unwrap();
    cmd.current_dir(dir)
        .env_remove("TABFIT_TARGET")
        .env_remove("TABFIT_MODEL_DIR")
        .env_remove("DB_USER")
        .env_remove("DB_PASSWORD")
        .env_remove("DB_HOST")
        .env_remove("DB_PORT")
        .env_remove("DB_PREDICTION_SCHEMA")
        .env("DB_NAME", "warehouse.db")
        .env("DB_PREDICTION_TABLE", "sales_predictions");
    cmd
}

/// Seeds the database and trains `models/model-sales.pkl`.
fn trained_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let conn = Connection::open(temp_dir.path().join("warehouse.db")).unwrap();
    conn.execute_batch(
        "CREATE TABLE sales (price REAL, units INTEGER, promo INTEGER, total_sales REAL);
         INSERT INTO sales VALUES (9.5, 10, 0, 95.0);
         INSERT INTO sales VALUES (10.0, 13, 1, 130.0);
         INSERT INTO sales VALUES (12.0, 8, 0, 96.0);
         CREATE TABLE upcoming (promo INTEGER, units INTEGER, price REAL);
         INSERT INTO upcoming VALUES (1, 14, 9.0);
         INSERT INTO upcoming VALUES (0, 9, 11.0);
         INSERT INTO upcoming VALUES (0, 11, 10.5);",
    )
    .unwrap();
    std::fs::write(temp_dir.path().join("train-sales.sql"), "SELECT * FROM sales").unwrap();
    std::fs::write(temp_dir.path().join("predict-sales.sql"), "SELECT * FROM upcoming").unwrap();

    tabfit(temp_dir.path()).arg("train").arg("train-sales.sql").assert().success();
    temp_dir
}

#[test]
fn test_predict_without_arguments_shows_usage() {
    let temp_dir = TempDir::new().unwrap();

    tabfit(temp_dir.path()).arg("predict").assert().failure().stderr(predicate::str::contains("Usage"));
    tabfit(temp_dir.path())
        .arg("predict")
        .arg("models/model-sales.pkl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_predict_writes_table() {
    let temp_dir = trained_workspace();

    tabfit(temp_dir.path())
        .arg("predict")
        .arg("models/model-sales.pkl")
        .arg("predict-sales.sql")
        .assert()
        .success()
        .stdout(predicate::str::contains("Predictions written"))
        .stdout(predicate::str::contains("sales_predictions"));

    let conn = Connection::open(temp_dir.path().join("warehouse.db")).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(prediction_total_sales) FROM sales_predictions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 3);
}

#[test]
fn test_predict_twice_replaces_table() {
    let temp_dir = trained_workspace();

    for _ in 0..2 {
        tabfit(temp_dir.path())
            .arg("predict")
            .arg("model-sales.pkl")
            .arg("predict-sales.sql")
            .assert()
            .success();
    }

    let conn = Connection::open(temp_dir.path().join("warehouse.db")).unwrap();
    let rows: i64 = conn.query_row("SELECT COUNT(*) FROM sales_predictions", [], |r| r.get(0)).unwrap();
    assert_eq!(rows, 3);
}

#[test]
fn test_predict_into_namespace() {
    let temp_dir = trained_workspace();

    tabfit(temp_dir.path())
        .env("DB_PREDICTION_SCHEMA", "reporting")
        .arg("predict")
        .arg("models/model-sales.pkl")
        .arg("predict-sales.sql")
        .assert()
        .success();

    let conn = Connection::open(temp_dir.path().join("reporting.db")).unwrap();
    let rows: i64 = conn.query_row("SELECT COUNT(*) FROM sales_predictions", [], |r| r.get(0)).unwrap();
    assert_eq!(rows, 3);
}

#[test]
fn test_predict_requires_destination_table() {
    let temp_dir = trained_workspace();

    tabfit(temp_dir.path())
        .env_remove("DB_PREDICTION_TABLE")
        .arg("predict")
        .arg("models/model-sales.pkl")
        .arg("predict-sales.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DB_PREDICTION_TABLE"));
}

#[test]
fn test_predict_rejects_non_pkl_model() {
    let temp_dir = trained_workspace();
    std::fs::write(temp_dir.path().join("model.bin"), b"not a model").unwrap();

    tabfit(temp_dir.path())
        .arg("predict")
        .arg("model.bin")
        .arg("predict-sales.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported format"));
}

#[test]
fn test_predict_missing_model() {
    let temp_dir = trained_workspace();

    tabfit(temp_dir.path())
        .arg("predict")
        .arg("models/model-missing.pkl")
        .arg("predict-sales.sql")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
