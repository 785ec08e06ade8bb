use crate::facade::Facade;
use crate::level::Severity;
use crate::value::{Fields, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets under this prefix are the crate's own diagnostics and are never
/// forwarded, so a failing sink cannot feed back into itself.
const OWN_TARGET: &str = "tiered_log";

/// `tracing_subscriber` layer that replays `tracing` events as facade log
/// calls.
///
/// An event with target `app::db` is logged through the facade's child
/// logger `app.db`; its fields become per-call fields and its `message`
/// field the record message. Events below `min_level` are dropped here,
/// before any record is built.
pub struct FacadeLayer {
    facade: Facade,
    min_level: Severity,
}

impl FacadeLayer {
    pub fn new(facade: Facade) -> Self {
        Self { facade, min_level: Severity::Debug }
    }

    pub fn with_min_level(mut self, min_level: Severity) -> Self {
        self.min_level = min_level;
        self
    }
}

impl<S> Layer<S> for FacadeLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(OWN_TARGET) {
            return;
        }
        let level = Severity::from(*meta.level());
        if level < self.min_level {
            return;
        }

        let mut fields = Fields::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);

        let logger = self.facade.get_logger(&meta.target().replace("::", "."));
        let message = message.unwrap_or_default();
        if let Err(e) = logger.log(level, &message, &[], Some(&fields)) {
            eprintln!("failed to forward tracing event from {}: {}", meta.target(), e);
        }
    }
}

/// Collects event fields into [`Fields`], splitting out `message`.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Fields,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::Str(format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::FacadeConfig;
    use crate::formatter;
    use crate::registry::Registry;
    use crate::sink::MemorySink;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    fn facade(low: &Arc<MemorySink>) -> Facade {
        let config = FacadeConfig::new("bridge")
            .with_low_sink(low.clone())
            .with_low_formatter(crate::StructuredFormatter::new())
            .with_high_sink(Arc::new(MemorySink::new()))
            .with_high_formatter(formatter::message_formatter());
        Facade::with_registry(config, Arc::new(Registry::new()))
    }

    #[test]
    fn test_events_become_records() {
        let low = Arc::new(MemorySink::new());
        let subscriber = tracing_subscriber::registry().with(FacadeLayer::new(facade(&low)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app::db", user_id = 42, ok = false, reason = "timeout", "query failed: %d");
            tracing::debug!(target: "app", "starting");
        });

        let lines: Vec<serde_json::Value> = low.lines().iter().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["name"], "bridge.app.db");
        assert_eq!(lines[0]["level"], "WARNING");
        assert_eq!(lines[0]["message"], "query failed: %d");
        assert_eq!(lines[0]["user_id"], 42);
        assert_eq!(lines[0]["ok"], false);
        assert_eq!(lines[0]["reason"], "timeout");
        assert_eq!(lines[1]["name"], "bridge.app");
    }

    #[test]
    fn test_min_level_and_own_target_are_skipped() {
        let low = Arc::new(MemorySink::new());
        let layer = FacadeLayer::new(facade(&low)).with_min_level(Severity::Warning);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "below minimum");
            tracing::error!(target: "tiered_log::handler", "internal");
            tracing::error!(target: "app", "kept");
        });

        assert_eq!(low.lines().len(), 1);
        assert!(low.contents().contains("kept"));
    }
}
