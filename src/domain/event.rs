//! Change events and webhook subscriptions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::OperationContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "entry.upsert")]
    EntryUpsert,
    #[serde(rename = "entry.deleted")]
    EntryDeleted,
    #[serde(rename = "template.created")]
    TemplateCreated,
    #[serde(rename = "template.updated")]
    TemplateUpdated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntryUpsert => "entry.upsert",
            Self::EntryDeleted => "entry.deleted",
            Self::TemplateCreated => "template.created",
            Self::TemplateUpdated => "template.updated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub transaction_id: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl Event {
    /// Builds an event stamped with the caller's transaction id and user.
    pub fn new(event_type: EventType, ctx: &OperationContext, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            transaction_id: ctx.transaction_id.to_string(),
            username: ctx.username().to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// A webhook subscription. An empty event list subscribes to everything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub events: Vec<EventType>,
}

impl Webhook {
    pub fn should_receive(&self, event: &Event) -> bool {
        self.events.is_empty() || self.events.contains(&event.event_type)
    }
}
