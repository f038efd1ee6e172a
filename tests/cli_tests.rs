//! Binary behaviour of `invoice-forge`.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/invoice.json")
}

fn forge() -> Command {
    let mut cmd = Command::cargo_bin("invoice-forge").unwrap();
    cmd.env_remove("INVOICE_FORGE_PRINT_ENDPOINT")
        .env_remove("INVOICE_FORGE_PRINT_TIMEOUT_SECS")
        .env_remove("INVOICE_FORGE_RASTER_SCALE");
    cmd
}

#[test]
fn help_prints_usage() {
    forge()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn missing_input_fails() {
    forge()
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input file specified"));
}

#[test]
fn unknown_template_fails() {
    forge()
        .arg(fixture())
        .args(["--template", "baroque"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown template 'baroque'"));
}

#[test]
fn totals_are_printed_with_labels() {
    forge()
        .arg(fixture())
        .arg("--totals")
        .assert()
        .success()
        .stdout(predicate::str::contains("inv-2025-014 (Mar 2, 2025 4:05 PM UTC)"))
        .stdout(predicate::str::contains("$110.00"))
        .stdout(predicate::str::contains("Amount Due"));
}

#[test]
fn client_export_writes_pdf() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.pdf");

    forge()
        .arg(fixture())
        .arg(&out)
        .args(["--client-only", "--banded"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Capturing..."))
        .stderr(predicate::str::contains("client export"));

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
}

#[test]
fn html_is_written_alongside() {
    let dir = tempdir().unwrap();
    let html = dir.path().join("print/invoice.html");
    let out = dir.path().join("out.pdf");

    forge()
        .arg(fixture())
        .arg(&out)
        .arg("--client-only")
        .arg("--html")
        .arg(&html)
        .assert()
        .success();

    let text = fs::read_to_string(&html).unwrap();
    assert!(text.starts_with("<!DOCTYPE html>"));
    assert!(text.contains("Northwind Studio"));
}

#[test]
fn unreachable_print_service_falls_back() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.pdf");

    forge()
        .arg(fixture())
        .arg(&out)
        .args(["--endpoint", "http://127.0.0.1:9/print"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Falling back after server export failed"));

    assert!(out.exists());
}
