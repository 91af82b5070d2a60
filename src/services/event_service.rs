//! # Event Fan-out
//!
//! Change events are published fire-and-forget: [`EventDispatcher`] hands an
//! event to every configured [`EventPublisher`] on a spawned task and logs
//! failures instead of returning them. [`EventDispatcher::flush`] lets a
//! short-lived process wait for deliveries before it exits.
//!
//! [`NotifyingEntryService`] composes this with any [`EntryUseCase`]: it runs
//! the inner use case unchanged, then emits one event for the batch.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn, Instrument};

use crate::config::EventConfig;
use crate::domain::{Entry, Event, EventType, OperationContext, OperationResult};
use crate::errors::Result;

use super::entry_service::EntryUseCase;

/// A destination for change events.
#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug {
    async fn publish(&self, event: &Event) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    publishers: Vec<Arc<dyn EventPublisher>>,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl EventDispatcher {
    pub fn new(publishers: Vec<Arc<dyn EventPublisher>>) -> Self {
        Self { publishers, in_flight: Arc::default() }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    /// Publishes on a background task and returns immediately.
    pub fn dispatch(&self, event: Event) {
        if self.publishers.is_empty() {
            return;
        }

        let publishers = self.publishers.clone();
        let delivery = async move {
            for publisher in publishers {
                if let Err(e) = publisher.publish(&event).await {
                    error!(
                        event_type = %event.event_type,
                        transaction_id = %event.transaction_id,
                        error = %e,
                        "Failed to publish event"
                    );
                }
            }
        };
        let handle = tokio::spawn(delivery.instrument(tracing::Span::current()));

        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Waits for every event dispatched so far to be delivered or dropped.
    /// Short-lived callers use this before exiting.
    pub async fn flush(&self) {
        let pending = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *in_flight)
        };
        for handle in pending {
            if let Err(e) = handle.await {
                warn!(error = %e, "Event delivery task failed");
            }
        }
    }
}

/// In-process subscribers over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    tx: broadcast::Sender<Event>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn from_config(config: &EventConfig) -> Self {
        Self::new(config.broadcast_capacity)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: &Event) -> Result<()> {
        match self.tx.send(event.clone()) {
            Ok(receivers) => debug!(event_type = %event.event_type, receivers = receivers, "Broadcast event"),
            Err(_) => debug!(event_type = %event.event_type, "No subscribers for event"),
        }
        Ok(())
    }
}

/// Entry use case that emits an event after every batch.
#[derive(Debug, Clone)]
pub struct NotifyingEntryService<U: EntryUseCase> {
    inner: U,
    events: EventDispatcher,
}

impl<U: EntryUseCase> NotifyingEntryService<U> {
    pub fn new(inner: U, events: EventDispatcher) -> Self {
        Self { inner, events }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }
}

#[async_trait]
impl<U: EntryUseCase> EntryUseCase for NotifyingEntryService<U> {
    async fn upsert(&self, ctx: &OperationContext, entries: Vec<Entry>) -> Vec<OperationResult> {
        let results = self.inner.upsert(ctx, entries).await;

        match serde_json::to_value(&results) {
            Ok(payload) => {
                self.events.dispatch(Event::new(EventType::EntryUpsert, ctx, payload));
            }
            Err(e) => warn!(error = %e, "Failed to encode upsert results for event"),
        }
        results
    }

    async fn delete(&self, ctx: &OperationContext, key: &str) -> Result<()> {
        self.inner.delete(ctx, key).await?;
        let payload = serde_json::json!({ "key": key });
        self.events.dispatch(Event::new(EventType::EntryDeleted, ctx, payload));
        Ok(())
    }
}
