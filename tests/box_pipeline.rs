//! Integration tests for box rendering
//!
//! Drives `BoxService::build_box` end to end over the in-memory stores.

mod common;

use std::collections::HashMap;

use common::{reference_entries, TestStores, REFERENCE_TEMPLATE};
use nbox::domain::{BoxTemplate, Entry, OperationContext};
use nbox::errors::NboxError;

fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn test_reference_box_renders() {
    let stores = TestStores::new()
        .with_entries(reference_entries())
        .with_template(BoxTemplate::new("test", "development", "task.json", REFERENCE_TEMPLATE))
        .await;
    let boxes = stores.box_service();

    let built = boxes
        .build_box(
            &OperationContext::new(),
            "test",
            "development",
            "task.json",
            &args(&[("service", "test"), ("stage", "development")]),
        )
        .await
        .unwrap();

    assert_eq!(
        built,
        r#"{"service": "test","ENV_1": "key-test", "ENV_2": "false", "GLOBAL_SERVICE": "xxxxx12345", "domain": "private.io", "version": "1", "missing":""}"#
    );
}

#[tokio::test]
async fn test_unresolved_placeholders_render_empty() {
    let template = "a={{ nowhere/a }} b={{b}} c={{ x/y/z }}";
    let stores = TestStores::new()
        .with_entries(vec![Entry::new("z", "zed").with_path("x/y")])
        .with_template(BoxTemplate::new("svc", "dev", "plain.txt", template))
        .await;

    let built = stores
        .box_service()
        .build_box(&OperationContext::new(), "svc", "dev", "plain.txt", &HashMap::new())
        .await
        .unwrap();

    assert_eq!(built, "a= b= c=zed");
    assert!(!built.contains("{{"));
}

#[tokio::test]
async fn test_args_substitute_custom_tokens() {
    let template = "image: {{ :service/:stage/image }}:{{ :service/:stage/:tag_key }}";
    let stores = TestStores::new()
        .with_entries(vec![
            Entry::new("image", "registry/app").with_path("app/prod"),
            Entry::new("release", "1.4.2").with_path("app/prod"),
        ])
        .with_template(BoxTemplate::new("app", "prod", "deploy.yaml", template))
        .await;

    let built = stores
        .box_service()
        .build_box(
            &OperationContext::new(),
            "app",
            "prod",
            "deploy.yaml",
            &args(&[("tag_key", "release")]),
        )
        .await
        .unwrap();

    assert_eq!(built, "image: registry/app:1.4.2");
}

#[tokio::test]
async fn test_structural_errors_have_no_output() {
    let stores = TestStores::new()
        .with_template(BoxTemplate::new("svc", "dev", "conf.ini", "{{a}}"))
        .await;
    let boxes = stores.box_service();
    let ctx = OperationContext::new();

    let unsupported = boxes.build_box(&ctx, "svc", "dev", "conf.ini", &HashMap::new()).await;
    assert!(matches!(unsupported, Err(NboxError::UnsupportedSchema { .. })));

    let missing = boxes.build_box(&ctx, "svc", "dev", "absent.json", &HashMap::new()).await;
    assert!(matches!(missing, Err(NboxError::NotFound { .. })));
}
