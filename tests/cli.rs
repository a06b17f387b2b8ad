mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestWorkspace;
use predicates::prelude::*;
use serde_json::Value;

const CUSTOMERS: &str = "id,name,phone\n1,Alice,5551234567\n2,Bob,5559876543\n3,Cara,5550001111\n";
const ORDERS: &str = "id,code,total\n2,7,10.50\n3,8,3.25\n4,9,7.00\n";

#[test]
fn probe_prints_type_table() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("customers.csv", CUSTOMERS);

    cargo_bin_cmd!("csv-colmatch")
        .args(["probe", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Column types for"))
        .stdout(predicate::str::is_match(r"phone\s+PhoneNumber\s+3\s+3").unwrap())
        .stdout(predicate::str::is_match(r"name\s+String").unwrap());
}

#[test]
fn probe_json_lists_every_column() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS);

    let output = cargo_bin_cmd!("csv-colmatch")
        .args(["probe", "-i", input.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("run probe");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json output");
    let labels = value["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .map(|c| c["label"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["Integer", "Integer", "Decimal"]);
    assert_eq!(value["rows_read"], 3);
}

#[test]
fn probe_honours_custom_date_format() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("events.csv", "when\n15.01.2024\n31.12.2023\n");

    cargo_bin_cmd!("csv-colmatch")
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "--date-format",
            "dd.MM.yyyy",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"when\s+Date").unwrap());
}

#[test]
fn compare_reports_similar_columns() {
    let workspace = TestWorkspace::new();
    let left = workspace.write("customers.csv", CUSTOMERS);
    let right = workspace.write("orders.csv", ORDERS);

    cargo_bin_cmd!("csv-colmatch")
        .args([
            "compare",
            "-l",
            left.to_str().unwrap(),
            "-r",
            right.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Similar columns between"))
        .stdout(predicate::str::is_match(r"id\s+id\s+Integer\s+0\.67").unwrap())
        .stdout(predicate::str::is_match(r"id\s+code\s+Integer").unwrap().not());
}

#[test]
fn compare_all_includes_non_matching_pairs() {
    let workspace = TestWorkspace::new();
    let left = workspace.write("customers.csv", CUSTOMERS);
    let right = workspace.write("orders.csv", ORDERS);

    cargo_bin_cmd!("csv-colmatch")
        .args([
            "compare",
            "-l",
            left.to_str().unwrap(),
            "-r",
            right.to_str().unwrap(),
            "--all",
            "--workers",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"id\s+code\s+Integer\s+0\.00").unwrap());
}

#[test]
fn compare_json_output_is_machine_readable() {
    let workspace = TestWorkspace::new();
    let left = workspace.write("customers.csv", CUSTOMERS);
    let right = workspace.write("orders.csv", ORDERS);

    let output = cargo_bin_cmd!("csv-colmatch")
        .args([
            "compare",
            "-l",
            left.to_str().unwrap(),
            "-r",
            right.to_str().unwrap(),
            "--format",
            "json",
        ])
        .output()
        .expect("run compare");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["outcome"]["evaluated"], 2);
    let matches = value["outcome"]["matches"].as_array().expect("matches");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["pair"]["left"], "id");
    assert_eq!(matches[0]["pair"]["right"], "id");
    assert_eq!(value["right"]["columns"][2]["label"], "Decimal");
}

#[test]
fn compare_uses_config_file() {
    let workspace = TestWorkspace::new();
    let left = workspace.write("customers.csv", CUSTOMERS);
    let right = workspace.write("orders.csv", ORDERS);
    let config = workspace.write("match.yml", "similarity_threshold: 0.9\nworker_count: 2\n");

    cargo_bin_cmd!("csv-colmatch")
        .args([
            "compare",
            "-l",
            left.to_str().unwrap(),
            "-r",
            right.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No similar columns"));
}

#[test]
fn compare_rejects_invalid_threshold() {
    let workspace = TestWorkspace::new();
    let left = workspace.write("customers.csv", CUSTOMERS);

    cargo_bin_cmd!("csv-colmatch")
        .args([
            "compare",
            "-l",
            left.to_str().unwrap(),
            "-r",
            left.to_str().unwrap(),
            "--threshold",
            "1.5",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Invalid configuration"));
}

#[test]
fn compare_reports_missing_input() {
    let workspace = TestWorkspace::new();
    let left = workspace.write("customers.csv", CUSTOMERS);
    let missing = workspace.path().join("absent.csv");

    cargo_bin_cmd!("csv-colmatch")
        .args([
            "compare",
            "-l",
            left.to_str().unwrap(),
            "-r",
            missing.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: Opening right input"));
}
