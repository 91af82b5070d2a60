//! Integration tests for event fan-out to webhooks

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestStores;
use nbox::config::EventConfig;
use nbox::domain::{BoxTemplate, Entry, EventType, OperationContext, Webhook};
use nbox::secrets::SecretReference;
use nbox::services::webhook_service::{sign, SIGNATURE_HEADER};
use nbox::services::{
    EntryUseCase, EventDispatcher, EventPublisher, NotifyingEntryService, WebhookEventPublisher,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_upsert_event_reaches_webhook_signed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/nbox"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = EventConfig {
        webhook_urls: vec![format!("{}/nbox", server.uri())],
        hmac_secret_key: Some("webhook-key".to_string()),
        ..Default::default()
    };
    let webhooks: Arc<dyn EventPublisher> = Arc::new(WebhookEventPublisher::from_config(&config));
    let events = EventDispatcher::new(vec![webhooks]);

    let stores = TestStores::new();
    let service =
        NotifyingEntryService::new(stores.entry_service(SecretReference::short()), events.clone());
    let ctx = OperationContext::new().with_username("ci");
    service.upsert(&ctx, vec![Entry::new("feature", "on").with_path("app")]).await;
    events.flush().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["type"], "entry.upsert");
    assert_eq!(body["username"], "ci");
    assert_eq!(body["transactionId"], ctx.transaction_id.to_string());
    assert_eq!(body["payload"][0]["key"], "app/feature");

    let signature = requests[0].headers.get(SIGNATURE_HEADER).unwrap().to_str().unwrap();
    assert_eq!(signature, format!("sha256={}", sign("webhook-key", &requests[0].body).unwrap()));
}

#[tokio::test]
async fn test_webhook_failures_never_reach_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

    let publisher = WebhookEventPublisher::new(None).with_retry_delay(Duration::from_millis(1));
    publisher.add_webhook(Webhook { id: "ops".into(), url: server.uri(), events: vec![] }).await;
    let events = EventDispatcher::new(vec![Arc::new(publisher) as Arc<dyn EventPublisher>]);

    let stores = TestStores::new();
    let service =
        NotifyingEntryService::new(stores.entry_service(SecretReference::short()), events.clone());
    let results = service.upsert(&OperationContext::new(), vec![Entry::new("k", "v")]).await;
    events.flush().await;

    assert!(!results[0].is_error());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_template_events_respect_subscriptions() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

    let publisher = WebhookEventPublisher::new(None);
    publisher
        .add_webhook(Webhook {
            id: "templates".into(),
            url: server.uri(),
            events: vec![EventType::TemplateCreated],
        })
        .await;
    let events = EventDispatcher::new(vec![Arc::new(publisher) as Arc<dyn EventPublisher>]);

    let stores = TestStores::new();
    let boxes = stores.box_service().with_events(events.clone());
    let ctx = OperationContext::new();
    let template = BoxTemplate::new("svc", "dev", "env.json", "{}");
    boxes.upsert_box(&ctx, template.clone()).await.unwrap();
    boxes.upsert_box(&ctx, template).await.unwrap();
    events.flush().await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["type"], "template.created");
    assert_eq!(body["payload"]["template"], "svc/dev/env.json");
}
