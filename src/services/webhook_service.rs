//! Webhook delivery for change events
//!
//! Posts each event as JSON to every subscribed webhook, signing the body with
//! HMAC-SHA256 when a key is configured, and retrying failed deliveries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::EventConfig;
use crate::domain::{Event, Webhook};
use crate::errors::{NboxError, Result};
use crate::utils::generate_id;

use super::event_service::EventPublisher;

/// Header carrying the body signature, `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "X-Nbox-Signature";

const MAX_RETRIES: u32 = 3;

/// Webhook delivery publisher
#[derive(Clone, Debug)]
pub struct WebhookEventPublisher {
    /// HTTP client for webhook delivery
    client: reqwest::Client,
    /// Subscribed webhooks
    webhooks: Arc<tokio::sync::RwLock<Vec<Webhook>>>,
    /// Signing key for request bodies
    secret: Option<String>,
    /// Base delay between attempts, multiplied by the attempt number
    retry_delay: Duration,
}

impl WebhookEventPublisher {
    pub fn new(secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            webhooks: Arc::new(tokio::sync::RwLock::new(Vec::new())),
            secret,
            retry_delay: Duration::from_millis(1000),
        }
    }

    /// Publisher subscribed to every configured URL for all event types.
    pub fn from_config(config: &EventConfig) -> Self {
        let publisher = Self::new(config.hmac_secret_key.clone());
        let webhooks = config
            .webhook_urls
            .iter()
            .map(|url| Webhook { id: generate_id(), url: url.clone(), events: Vec::new() })
            .collect();
        Self { webhooks: Arc::new(tokio::sync::RwLock::new(webhooks)), ..publisher }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Add a webhook, replacing any with the same id
    pub async fn add_webhook(&self, webhook: Webhook) {
        let mut webhooks = self.webhooks.write().await;
        webhooks.retain(|w| w.id != webhook.id);
        webhooks.push(webhook);
    }

    pub async fn remove_webhook(&self, id: &str) {
        self.webhooks.write().await.retain(|w| w.id != id);
    }

    pub async fn list_webhooks(&self) -> Vec<Webhook> {
        self.webhooks.read().await.clone()
    }

    /// Deliver to one webhook with retry logic
    async fn deliver(
        client: reqwest::Client,
        webhook: Webhook,
        body: Arc<String>,
        signature: Option<Arc<String>>,
        retry_delay: Duration,
        event_type: String,
    ) -> Result<()> {
        for attempt in 1..=MAX_RETRIES {
            match Self::send(&client, &webhook, &body, signature.as_deref()).await {
                Ok(status) => {
                    info!(
                        webhook_id = %webhook.id,
                        webhook_url = %webhook.url,
                        event_type = %event_type,
                        status_code = status.as_u16(),
                        attempt = attempt,
                        "Webhook delivered successfully"
                    );
                    return Ok(());
                }
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(
                        webhook_id = %webhook.id,
                        webhook_url = %webhook.url,
                        event_type = %event_type,
                        error = %e,
                        attempt = attempt,
                        "Webhook delivery failed, retrying"
                    );
                    tokio::time::sleep(retry_delay * attempt).await;
                }
                Err(e) => {
                    error!(
                        webhook_id = %webhook.id,
                        webhook_url = %webhook.url,
                        event_type = %event_type,
                        error = %e,
                        attempts = MAX_RETRIES,
                        "Webhook delivery failed after all retries"
                    );
                    return Err(e);
                }
            }
        }
        Err(NboxError::publish(format!("webhook '{}' was never attempted", webhook.id)))
    }

    /// Send a webhook HTTP request
    async fn send(
        client: &reqwest::Client,
        webhook: &Webhook,
        body: &str,
        signature: Option<&String>,
    ) -> Result<reqwest::StatusCode> {
        let mut request = client.post(&webhook.url).header("Content-Type", "application/json");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, format!("sha256={}", signature));
        }

        let response = request
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| NboxError::publish(format!("Webhook delivery failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NboxError::publish(format!("Webhook endpoint returned error status: {}", status)));
        }
        Ok(status)
    }
}

/// Hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| NboxError::internal(format!("Invalid webhook secret: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl EventPublisher for WebhookEventPublisher {
    async fn publish(&self, event: &Event) -> Result<()> {
        let targets: Vec<Webhook> =
            self.webhooks.read().await.iter().filter(|w| w.should_receive(event)).cloned().collect();
        if targets.is_empty() {
            return Ok(());
        }

        let body = Arc::new(serde_json::to_string(event)?);
        let signature = match &self.secret {
            Some(secret) => Some(Arc::new(sign(secret, body.as_bytes())?)),
            None => None,
        };

        let mut deliveries = JoinSet::new();
        for webhook in targets {
            deliveries.spawn(Self::deliver(
                self.client.clone(),
                webhook,
                Arc::clone(&body),
                signature.clone(),
                self.retry_delay,
                event.event_type.to_string(),
            ));
        }

        let mut failed = 0usize;
        while let Some(joined) = deliveries.join_next().await {
            if !matches!(joined, Ok(Ok(()))) {
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(NboxError::publish(format!("{} webhook deliveries failed", failed)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventType, OperationContext};
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> Event {
        Event::new(EventType::EntryUpsert, &OperationContext::new(), serde_json::json!([]))
    }

    #[test]
    fn test_sign_is_stable() {
        let a = sign("key", b"body").unwrap();
        assert_eq!(a, sign("key", b"body").unwrap());
        assert_ne!(a, sign("other", b"body").unwrap());
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_delivers_signed_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks"))
            .and(header("Content-Type", "application/json"))
            .and(header_exists(SIGNATURE_HEADER))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = EventConfig {
            webhook_urls: vec![format!("{}/hooks", server.uri())],
            hmac_secret_key: Some("shh".to_string()),
            ..Default::default()
        };
        let publisher = WebhookEventPublisher::from_config(&config);

        publisher.publish(&event()).await.unwrap();
    }

    #[tokio::test]
    async fn test_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let publisher = WebhookEventPublisher::new(None).with_retry_delay(Duration::from_millis(1));
        publisher
            .add_webhook(Webhook { id: "ops".into(), url: server.uri(), events: vec![] })
            .await;

        assert!(publisher.publish(&event()).await.is_err());
    }

    #[tokio::test]
    async fn test_filtered_webhooks_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let publisher = WebhookEventPublisher::new(None);
        publisher
            .add_webhook(Webhook { id: "del".into(), url: server.uri(), events: vec![EventType::EntryDeleted] })
            .await;

        publisher.publish(&event()).await.unwrap();
        assert_eq!(publisher.list_webhooks().await.len(), 1);
        publisher.remove_webhook("del").await;
        assert!(publisher.list_webhooks().await.is_empty());
    }
}
