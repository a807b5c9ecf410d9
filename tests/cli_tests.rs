// CLI integration tests for the invoice-review binary
// Network-facing commands run against a wiremock invoice service

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn invoice_review(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invoice-review").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("INVOICE_REVIEW_TOKEN");
    cmd
}

fn against(server: &MockServer, dir: &TempDir) -> Command {
    let mut cmd = invoice_review(dir);
    cmd.env("INVOICE_REVIEW_API__BASE_URL", server.uri())
        .env("INVOICE_REVIEW_API__CACHE_TTL_SECONDS", "0");
    cmd
}

fn invoice(id: u64, state: i64) -> serde_json::Value {
    json!({
        "id": id,
        "fileName": format!("invoice-{id}.pdf"),
        "state": state,
        "attributes": [
            {
                "attributeName": "InvoiceId",
                "attributeValue": "A-100",
                "isAttributeMapped": false,
                "position": [{"pageIndex": 0, "left": 10.0, "top": 5.0, "width": 20.0, "height": 3.0}]
            },
            {"attributeName": "InvoiceDate", "attributeValue": "01/02/2024", "isAttributeMapped": false},
            {"attributeName": "InvoiceTotal", "attributeValue": "250", "isAttributeMapped": true}
        ]
    })
}

// assert_cmd blocks, so it runs off the runtime that drives the mock server
async fn run(mut cmd: Command) -> Assert {
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    output.assert()
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    invoice_review(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("highlights"));
}

#[test]
fn test_no_arguments_shows_getting_started() {
    let dir = TempDir::new().unwrap();
    invoice_review(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("invoice-review list"));
}

#[test]
fn test_init_writes_config_and_respects_force() {
    let dir = TempDir::new().unwrap();

    invoice_review(&dir).arg("init").assert().success();
    let written = std::fs::read_to_string(dir.path().join("invoice-review.toml")).unwrap();
    assert!(written.contains("https://localhost:44307"));

    invoice_review(&dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    invoice_review(&dir).args(["init", "--force"]).assert().success();
}

#[test]
fn test_upload_rejects_non_pdf_before_connecting() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "not a pdf").unwrap();

    invoice_review(&dir)
        .env("INVOICE_REVIEW_API__BASE_URL", "http://127.0.0.1:9")
        .arg("upload")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Please select a valid PDF file"))
        .stdout(predicate::str::contains("Connecting").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_shows_status_and_actions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([invoice(1, 1), invoice(2, 5)])))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut cmd = against(&server, &dir);
    cmd.arg("list");
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("invoice-1.pdf"))
        .stdout(predicate::str::contains("Processed"))
        .stdout(predicate::str::contains("Completed"))
        .stdout(predicate::str::contains("2 invoices, 1 completed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_refuses_incomplete_invoice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice(1, 4)))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut cmd = against(&server, &dir);
    cmd.args(["download", "1"]);
    run(cmd)
        .await
        .failure()
        .stderr(predicate::str::contains("only completed invoices can be downloaded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_download_saves_generated_pdf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice(2, 5)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/GetCustomInvoice/2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 final".to_vec()))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut cmd = against(&server, &dir);
    cmd.args(["download", "2"]);
    run(cmd).await.success();

    let saved = std::fs::read(dir.path().join("invoice-2.pdf")).unwrap();
    assert_eq!(saved, b"%PDF-1.7 final");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_review_runs_through_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice(1, 1)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/GetCustomInvoice/1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 custom".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/Invoice/UploadCustomInvoice/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut cmd = against(&server, &dir);
    cmd.args(["review", "1", "--map-all", "--through", "generate"]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("Invoice Validated Successfully"))
        .stdout(predicate::str::contains("Custom_Invoice_invoice-1.pdf uploaded"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_review_blocks_on_unmapped_attributes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice(1, 1)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut cmd = against(&server, &dir);
    cmd.args(["review", "1", "--confirm", "InvoiceId"]);
    run(cmd)
        .await
        .failure()
        .stdout(predicate::str::contains("Still unmapped: InvoiceDate"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_highlights_svg_overlay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice(1, 1)))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut cmd = against(&server, &dir);
    cmd.args(["highlights", "1", "--svg"]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("<rect"))
        .stdout(predicate::str::contains("#f9c555"));
}
