//! Review workflow integration tests
//!
//! The session is driven against a wiremock invoice service end to end, and
//! against a mockall double where the test needs to prove a call never happens.

use async_trait::async_trait;
use invoice_review::api::{ApiError, InvoiceApi, InvoiceApiClient};
use invoice_review::config::ApiConfig;
use invoice_review::invoice::{Invoice, InvoiceState};
use invoice_review::workflow::{
    NextAction, NoticeLevel, ReviewSession, ReviewSettings, StepOutcome, WizardStep,
    WorkflowError, DISCARDED_NOTICE, VALIDATED_NOTICE,
};
use mockall::mock;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mock! {
    pub Store {}

    #[async_trait]
    impl InvoiceApi for Store {
        async fn list_invoices(&self) -> Result<Vec<Invoice>, ApiError>;
        async fn get_invoice(&self, id: &str) -> Result<Invoice, ApiError>;
        async fn update_invoice(&self, invoice: &Invoice) -> Result<(), ApiError>;
        async fn upload_invoice(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), ApiError>;
        async fn get_custom_invoice(&self, id: &str) -> Result<Vec<u8>, ApiError>;
        async fn upload_custom_invoice(&self, id: &str, file_name: &str, bytes: Vec<u8>) -> Result<(), ApiError>;
        async fn fetch_document(&self, url: &str) -> Result<Vec<u8>, ApiError>;
    }
}

fn invoice_json(state: i64, date: &str) -> Value {
    json!({
        "id": 7,
        "fileName": "acme.pdf",
        "fileUrl": "/files/acme.pdf",
        "state": state,
        "attributes": [
            {"attributeName": "InvoiceId", "attributeValue": "A-100", "isAttributeMapped": false},
            {"attributeName": "InvoiceDate", "attributeValue": date, "isAttributeMapped": false},
            {"attributeName": "InvoiceTotal", "attributeValue": "250", "isAttributeMapped": false},
            {
                "attributeName": "Items",
                "attributeValue": null,
                "isAttributeMapped": false,
                "children": [
                    {
                        "attributeName": "Item",
                        "children": [
                            {"attributeName": "Description", "attributeValue": "Widget"},
                            {"attributeName": "Amount", "attributeValue": "250"}
                        ]
                    }
                ]
            }
        ]
    })
}

async fn service_with_invoice(state: i64, date: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(invoice_json(state, date)))
        .mount(&server)
        .await;
    server
}

fn client(server: &MockServer) -> Arc<dyn InvoiceApi> {
    let config = ApiConfig {
        base_url: server.uri(),
        requests_per_second: 100,
        burst_capacity: 100,
        cache_ttl_seconds: 0,
        ..ApiConfig::default()
    };
    Arc::new(InvoiceApiClient::new(&config).unwrap())
}

#[tokio::test]
async fn test_full_review_from_mapping_to_success() {
    let server = service_with_invoice(1, "01/02/2024").await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .and(body_partial_json(json!({"state": 2})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .and(body_partial_json(json!({"state": 4})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/Invoice/GetCustomInvoice/7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 custom".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/Invoice/UploadCustomInvoice/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ReviewSession::open(client(&server), "7", ReviewSettings::default())
        .await
        .unwrap();
    assert_eq!(session.step(), WizardStep::Mapping);

    session.editor_mut().select_all(true);
    assert_eq!(
        session.next().await.unwrap(),
        StepOutcome::Advanced(WizardStep::Validate)
    );
    assert_eq!(session.next_action(), NextAction::Next);

    assert_eq!(
        session.next().await.unwrap(),
        StepOutcome::Advanced(WizardStep::Generate)
    );
    assert_eq!(session.invoice().state, InvoiceState::Validated);

    assert_eq!(
        session.next().await.unwrap(),
        StepOutcome::Advanced(WizardStep::Success)
    );
    assert_eq!(session.generated_preview().unwrap().len(), 15);

    let notices = session.take_notices();
    assert!(notices.iter().any(|n| n.message == VALIDATED_NOTICE));
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Success));

    let requests = server.received_requests().await.unwrap();
    let upload = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    assert!(String::from_utf8_lossy(&upload.body).contains("Custom_Invoice_acme.pdf"));
}

#[tokio::test]
async fn test_mapping_commit_sends_edited_attributes() {
    let server = service_with_invoice(1, "01/02/2024").await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ReviewSession::open(client(&server), "7", ReviewSettings::default())
        .await
        .unwrap();
    let editor = session.editor_mut();
    editor.select_all(true);
    let id = editor.find_root("InvoiceId").unwrap();
    editor.set_value(id, "A-200").unwrap();

    session.next().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
    let body: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(body["state"], json!(2));
    assert_eq!(body["fileName"], json!("acme.pdf"));
    assert_eq!(body["attributes"][0]["attributeValue"], json!("A-200"));
    assert_eq!(body["attributes"][3]["children"][0]["children"][1]["isAttributeMapped"], json!(true));
}

#[tokio::test]
async fn test_reopened_invoice_with_bad_date_is_discarded() {
    let server = service_with_invoice(2, "2024-01-01").await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .and(body_partial_json(json!({"state": 3})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ReviewSession::open(client(&server), "7", ReviewSettings::default())
        .await
        .unwrap();
    assert_eq!(session.step(), WizardStep::Validate);
    assert!(session.validation_failed());
    assert_eq!(session.next_action(), NextAction::Discard);

    assert_eq!(session.next().await.unwrap(), StepOutcome::Discarded);
    assert_eq!(session.step(), WizardStep::Validate);
    assert_eq!(session.invoice().state, InvoiceState::Discarded);
    assert_eq!(session.notices().last().unwrap().message, DISCARDED_NOTICE);
}

#[tokio::test]
async fn test_bad_date_found_after_mapping_is_discarded() {
    let server = service_with_invoice(1, "2024-01-01").await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .and(body_partial_json(json!({"state": 2})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .and(body_partial_json(json!({"state": 3})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ReviewSession::open(client(&server), "7", ReviewSettings::default())
        .await
        .unwrap();
    assert_eq!(session.step(), WizardStep::Mapping);
    assert_eq!(session.next_action(), NextAction::Next);

    session.editor_mut().select_all(true);
    assert_eq!(
        session.next().await.unwrap(),
        StepOutcome::Advanced(WizardStep::Validate)
    );
    assert_eq!(session.next_action(), NextAction::Discard);

    assert_eq!(session.next().await.unwrap(), StepOutcome::Discarded);
    assert_eq!(session.invoice().state, InvoiceState::Discarded);
}

#[tokio::test]
async fn test_server_failure_keeps_step_and_is_not_retried() {
    let server = service_with_invoice(1, "01/02/2024").await;
    Mock::given(method("PUT"))
        .and(path("/api/invoice/7"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = ReviewSession::open(client(&server), "7", ReviewSettings::default())
        .await
        .unwrap();
    session.editor_mut().select_all(true);

    let err = session.next().await.unwrap_err();
    assert!(matches!(err, WorkflowError::Api(ApiError::Http { status: 500, .. })));
    assert_eq!(session.step(), WizardStep::Mapping);
    assert_eq!(session.invoice().state, InvoiceState::Processed);
    assert_eq!(session.notices().last().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_unmapped_attribute_blocks_without_persisting() {
    let raw: Invoice = serde_json::from_value(invoice_json(1, "01/02/2024")).unwrap();
    let mut store = MockStore::new();
    store
        .expect_get_invoice()
        .times(1)
        .returning(move |_| Ok(raw.clone()));
    store.expect_update_invoice().times(0);

    let mut session = ReviewSession::open(Arc::new(store), "7", ReviewSettings::default())
        .await
        .unwrap();
    let editor = session.editor_mut();
    editor.select_all(true);
    let total = editor.find_root("InvoiceTotal").unwrap();
    editor.toggle_mapped(total).unwrap();

    match session.next().await {
        Err(WorkflowError::UnmappedAttributes(names)) => {
            assert_eq!(names, vec!["InvoiceTotal".to_string()]);
        }
        other => panic!("expected unmapped attributes, got {other:?}"),
    }
    assert_eq!(session.step(), WizardStep::Mapping);
}

#[tokio::test]
async fn test_back_is_local_and_clears_validation_flag() {
    let raw: Invoice = serde_json::from_value(invoice_json(2, "31/12/2999")).unwrap();
    let mut store = MockStore::new();
    store
        .expect_get_invoice()
        .returning(move |_| Ok(raw.clone()));
    store.expect_update_invoice().times(0);

    let mut session = ReviewSession::open(Arc::new(store), "7", ReviewSettings::default())
        .await
        .unwrap();
    assert!(session.validation_failed());

    assert_eq!(session.back(), WizardStep::Mapping);
    assert!(!session.validation_failed());
    assert_eq!(session.next_action(), NextAction::Next);
}
