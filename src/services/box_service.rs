//! # Box Pipeline
//!
//! Resolves a stored box template into a concrete document:
//!
//! 1. the schema is derived from the template name's extension
//! 2. the raw template is fetched and its literal `:tokens` replaced
//! 3. every prefix referenced by a placeholder is listed from the entry store
//! 4. placeholders are substituted in one pass from the resulting lookup
//!
//! Unknown placeholders render as empty strings. Any structural or store
//! failure fails the whole build; there is no partial output.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, Instrument};

use crate::domain::{
    path, BoxTemplate, Event, EventType, OperationContext, OperationType, SchemaType,
};
use crate::errors::{NboxError, Result};
use crate::storage::{EntryRepository, TemplateRepository};
use crate::template;

use super::event_service::EventDispatcher;

#[derive(Debug, Clone)]
pub struct BoxService {
    templates: Arc<dyn TemplateRepository>,
    entries: Arc<dyn EntryRepository>,
    events: Option<EventDispatcher>,
}

impl BoxService {
    pub fn new(templates: Arc<dyn TemplateRepository>, entries: Arc<dyn EntryRepository>) -> Self {
        Self { templates, entries, events: None }
    }

    /// Emit `template.created`/`template.updated` events on [`Self::upsert_box`].
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = Some(events);
        self
    }

    pub async fn build_box(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        template_name: &str,
        args: &HashMap<String, String>,
    ) -> Result<String> {
        let span = crate::box_span!(service, stage, template_name, args = args.len());
        async move {
            ctx.ensure_active("build box")?;
            let schema = SchemaType::from_template_name(template_name)?;
            let raw = self.load_template(ctx, service, stage, template_name, args).await?;

            let mut lookup = HashMap::new();
            for prefix in template::prefixes(&raw) {
                ctx.ensure_active("build box")?;
                let entries = self.entries.list(ctx, &prefix).await?;
                for entry in entries.iter().filter(|e| e.path.trim() == prefix) {
                    let value = schema.transform(&entry.value)?;
                    lookup.insert(path::concat(&prefix, &entry.key), value);
                }
            }

            let document = template::substitute(&raw, &lookup);
            info!(schema = %schema, resolved = lookup.len(), "Built box");
            Ok(document)
        }
        .instrument(span)
        .await
    }

    /// Placeholder variables of the raw template, before token substitution.
    pub async fn list_vars(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        template_name: &str,
    ) -> Result<Vec<String>> {
        ctx.ensure_active("list vars")?;
        let raw = self.fetch(ctx, service, stage, template_name).await?;
        Ok(template::variables(&raw))
    }

    /// Prefixes a build would look up, after token substitution.
    pub async fn prefixes(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        template_name: &str,
        args: &HashMap<String, String>,
    ) -> Result<BTreeSet<String>> {
        ctx.ensure_active("list prefixes")?;
        let raw = self.load_template(ctx, service, stage, template_name, args).await?;
        Ok(template::prefixes(&raw))
    }

    pub async fn upsert_box(
        &self,
        ctx: &OperationContext,
        template: BoxTemplate,
    ) -> Result<OperationType> {
        SchemaType::from_template_name(&template.name)?;
        template.validate()?;

        let location = template.location();
        let action = self.templates.upsert_box(ctx, template).await?;

        if let Some(events) = &self.events {
            let event_type = match action {
                OperationType::Created => EventType::TemplateCreated,
                _ => EventType::TemplateUpdated,
            };
            let payload = serde_json::json!({ "template": location });
            events.dispatch(Event::new(event_type, ctx, payload));
        }
        Ok(action)
    }

    pub async fn box_exists(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        template_name: &str,
    ) -> Result<bool> {
        self.templates.box_exists(ctx, service, stage, template_name).await
    }

    pub async fn list_boxes(&self, ctx: &OperationContext) -> Result<Vec<BoxTemplate>> {
        self.templates.list(ctx).await
    }

    /// Fetches the template and applies token substitution.
    async fn load_template(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        template_name: &str,
        args: &HashMap<String, String>,
    ) -> Result<String> {
        let raw = self.fetch(ctx, service, stage, template_name).await?;
        let substituted = template::substitute_tokens(&raw, service, stage, template_name, args)?;
        debug!(bytes = substituted.len(), "Substituted template tokens");
        Ok(substituted)
    }

    async fn fetch(
        &self,
        ctx: &OperationContext,
        service: &str,
        stage: &str,
        template_name: &str,
    ) -> Result<String> {
        let bytes = self.templates.retrieve_box(ctx, service, stage, template_name).await?;
        String::from_utf8(bytes).map_err(|_| {
            NboxError::template(format!(
                "template '{}' is not valid UTF-8",
                crate::domain::box_template::location(service, stage, template_name)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entry;
    use crate::services::BroadcastEventPublisher;
    use crate::storage::{InMemoryEntryRepository, InMemoryTemplateRepository};

    async fn service_with(template: &str, name: &str, entries: Vec<Entry>) -> BoxService {
        let templates = InMemoryTemplateRepository::new();
        templates
            .upsert_box(&OperationContext::new(), BoxTemplate::new("svc", "dev", name, template))
            .await
            .unwrap();
        let entries = InMemoryEntryRepository::default().with_entries(entries);
        BoxService::new(Arc::new(templates), Arc::new(entries))
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_structural() {
        let service = service_with("{}", "box.toml", vec![]).await;
        let ctx = OperationContext::new();
        let result = service.build_box(&ctx, "svc", "dev", "box.toml", &HashMap::new()).await;
        assert!(matches!(result, Err(NboxError::UnsupportedSchema { .. })));
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let service = service_with("{}", "box.json", vec![]).await;
        let ctx = OperationContext::new();
        let result = service.build_box(&ctx, "svc", "dev", "other.json", &HashMap::new()).await;
        assert!(matches!(result, Err(NboxError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_json_values_are_escaped() {
        let entries = vec![Entry::new("quote", "say \"hi\"\n").with_path("app")];
        let service = service_with(r#"{"q": "{{app/quote}}"}"#, "box.json", entries).await;
        let ctx = OperationContext::new();
        let built = service.build_box(&ctx, "svc", "dev", "box.json", &HashMap::new()).await;
        assert_eq!(built.unwrap(), r#"{"q": "say \"hi\"\n"}"#);
    }

    #[tokio::test]
    async fn test_deeper_entries_do_not_leak_into_prefix() {
        let entries = vec![
            Entry::new("name", "outer").with_path("app"),
            Entry::new("name", "inner").with_path("app/nested"),
        ];
        let service = service_with("{{app/name}} {{app/nested/name}}", "box.txt", entries).await;
        let ctx = OperationContext::new();
        let built = service.build_box(&ctx, "svc", "dev", "box.txt", &HashMap::new()).await;
        assert_eq!(built.unwrap(), "outer inner");
    }

    #[tokio::test]
    async fn test_resolved_values_are_not_resubstituted() {
        let entries = vec![
            Entry::new("a", "{{app/b}}").with_path("app"),
            Entry::new("b", "boom").with_path("app"),
        ];
        let service = service_with("{{app/a}}", "box.yaml", entries).await;
        let ctx = OperationContext::new();
        let built = service.build_box(&ctx, "svc", "dev", "box.yaml", &HashMap::new()).await;
        assert_eq!(built.unwrap(), "{{app/b}}");
    }

    #[tokio::test]
    async fn test_list_vars_and_prefixes() {
        let template = "{{ :service/:stage/a }} {{ shared/b }} {{ shared/b }}";
        let service = service_with(template, "box.txt", vec![]).await;
        let ctx = OperationContext::new();

        let vars = service.list_vars(&ctx, "svc", "dev", "box.txt").await.unwrap();
        assert_eq!(vars, vec![":service/:stage/a".to_string(), "shared/b".to_string()]);

        let prefixes =
            service.prefixes(&ctx, "svc", "dev", "box.txt", &HashMap::new()).await.unwrap();
        let prefixes: Vec<String> = prefixes.into_iter().collect();
        assert_eq!(prefixes, vec!["shared".to_string(), "svc/dev".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_build() {
        let service = service_with("{}", "box.json", vec![]).await;
        let ctx = OperationContext::new();
        ctx.cancel();
        let result = service.build_box(&ctx, "svc", "dev", "box.json", &HashMap::new()).await;
        assert!(matches!(result, Err(NboxError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_upsert_box_emits_events() {
        let broadcast = Arc::new(BroadcastEventPublisher::new(4));
        let mut rx = broadcast.subscribe();
        let service = BoxService::new(
            Arc::new(InMemoryTemplateRepository::new()),
            Arc::new(InMemoryEntryRepository::default()),
        )
        .with_events(EventDispatcher::default().with_publisher(broadcast));
        let ctx = OperationContext::new();
        let template = BoxTemplate::new("svc", "dev", "box.json", "{}");

        let first = service.upsert_box(&ctx, template.clone()).await.unwrap();
        let second = service.upsert_box(&ctx, template).await.unwrap();
        assert_eq!(first, OperationType::Created);
        assert_eq!(second, OperationType::Updated);
        let received = [rx.recv().await.unwrap().event_type, rx.recv().await.unwrap().event_type];
        assert!(received.contains(&EventType::TemplateCreated));
        assert!(received.contains(&EventType::TemplateUpdated));

        assert!(service.box_exists(&ctx, "svc", "dev", "box.json").await.unwrap());
        assert_eq!(service.list_boxes(&ctx).await.unwrap().len(), 1);

        let bad = BoxTemplate::new("svc", "dev", "box.ini", "x");
        let rejected = service.upsert_box(&ctx, bad).await;
        assert!(matches!(rejected, Err(NboxError::UnsupportedSchema { .. })));
    }
}
