//! Integration tests for entry export

mod common;

use std::sync::Arc;

use common::TestStores;
use nbox::domain::{Entry, ExportFormat, ExportOptions, OperationContext};
use nbox::errors::NboxError;
use nbox::secrets::SecretReference;
use nbox::services::export_service::compute_sha256;
use nbox::services::{EntryUseCase, ExportService};

async fn seeded() -> TestStores {
    let stores = TestStores::new();
    let service = stores.entry_service(SecretReference::qualified("eu-west-1", "123456789012"));
    let results = service
        .upsert(
            &OperationContext::new(),
            vec![
                Entry::new("log-level", "info").with_path("billing/prod"),
                Entry::new("db.password", "hunter2").with_path("billing/prod").secure(),
                Entry::new("greeting", "hello world").with_path("billing/prod"),
                Entry::new("unrelated", "x").with_path("search/prod"),
            ],
        )
        .await;
    assert!(results.iter().all(|r| !r.is_error()));
    stores
}

fn exporter(stores: &TestStores) -> ExportService {
    ExportService::new(Arc::new(stores.entries.clone()), "nbox")
}

#[tokio::test]
async fn test_ecs_export_points_secrets_at_references() {
    let stores = seeded().await;
    let options = ExportOptions::new("billing", ExportFormat::Ecs);
    let result = exporter(&stores).export(&OperationContext::new(), options).await.unwrap();

    assert_eq!(result.entries, 3);
    assert_eq!(result.checksum, compute_sha256(&result.content));

    let json: serde_json::Value = serde_json::from_slice(&result.content).unwrap();
    assert_eq!(json["secrets"][0]["name"], "DB_PASSWORD");
    assert_eq!(
        json["secrets"][0]["valueFrom"],
        "arn:aws:ssm:eu-west-1:123456789012:parameter/billing/prod/db.password"
    );
    assert_eq!(json["environment"].as_array().unwrap().len(), 2);
    assert!(!String::from_utf8_lossy(&result.content).contains("hunter2"));
}

#[tokio::test]
async fn test_dotenv_export() {
    let stores = seeded().await;
    let options = ExportOptions::new("billing/prod", ExportFormat::Dotenv);
    let result = exporter(&stores).export(&OperationContext::new(), options).await.unwrap();

    let text = String::from_utf8(result.content).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.contains(&"LOG_LEVEL=info"));
    assert!(lines.contains(&"GREETING=\"hello world\""));
}

#[tokio::test]
async fn test_empty_export_is_an_error() {
    let stores = seeded().await;
    let options = ExportOptions::new("payments", ExportFormat::Yaml);
    let result = exporter(&stores).export(&OperationContext::new(), options).await;
    assert!(matches!(result, Err(NboxError::NotFound { .. })));
}
