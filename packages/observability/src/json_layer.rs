//! JSONL layer for session logs.
//!
//! One JSON object per event. Session identity fields (`connector`,
//! `chain_id`, `generation`, `attachment`, `phase`) are lifted out of the
//! event's fields into a `session` object so a single session can be
//! followed with `jq 'select(.session.connector == "injected")'`. The names
//! of the enclosing spans are listed root first.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Event fields that identify the session an event belongs to.
pub const SESSION_KEYS: &[&str] = &[
    "connector",
    "chain_id",
    "generation",
    "attachment",
    "phase",
];

/// A single JSONL record.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: &'static str,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub session: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<String>,
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    session: Map<String, Value>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else if SESSION_KEYS.contains(&name) {
            self.session.insert(name.to_string(), value);
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form.
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}

/// Layer writing one [`LogRecord`] per event to `make_writer`.
pub struct JsonLayer<W> {
    service: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service: impl Into<String>, make_writer: W) -> Self {
        Self {
            service: service.into(),
            pid: std::process::id(),
            make_writer,
        }
    }

    fn record<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> LogRecord
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let spans = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|span| span.name().to_string()).collect())
            .unwrap_or_default();

        let metadata = event.metadata();
        LogRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: metadata.level().as_str(),
            service: self.service.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            session: visitor.session,
            fields: visitor.fields,
            spans,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let record = self.record(event, &ctx);
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };
        let mut writer = self.make_writer.make_writer();
        let _ = writeln!(writer, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CentralLogWriter;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(events: impl FnOnce()) -> Vec<Value> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let writer = CentralLogWriter::new(&path).unwrap();
        let subscriber =
            tracing_subscriber::registry().with(JsonLayer::new("web3-session", writer));

        tracing::subscriber::with_default(subscriber, events);

        std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_session_fields_are_lifted() {
        let lines = capture(|| {
            tracing::info!(connector = "injected", chain_id = 5u64, "Connector activated");
            tracing::warn!(started_at = 3u64, "Suppressed stale connector activation");
        });

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["level"], "INFO");
        assert_eq!(lines[0]["service"], "web3-session");
        assert_eq!(lines[0]["message"], "Connector activated");
        assert_eq!(lines[0]["session"]["connector"], "injected");
        assert_eq!(lines[0]["session"]["chain_id"], 5);
        assert!(lines[0].get("fields").is_none());

        assert_eq!(lines[1]["level"], "WARN");
        assert_eq!(lines[1]["fields"]["started_at"], 3);
        assert!(lines[1].get("session").is_none());
    }

    #[test]
    fn test_spans_listed_from_root() {
        let lines = capture(|| {
            let outer = tracing::info_span!("cli");
            let _outer = outer.enter();
            let inner = tracing::info_span!("switch");
            let _inner = inner.enter();
            tracing::debug!(phase = "active", "Session transition");
        });

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["spans"], serde_json::json!(["cli", "switch"]));
        assert_eq!(lines[0]["session"]["phase"], "active");
    }

    #[test]
    fn test_record_skips_empty_sections() {
        let record = LogRecord {
            timestamp: "2024-01-15T10:30:00.000Z".to_string(),
            level: "INFO",
            service: "web3-session".to_string(),
            pid: 1,
            target: "session_manager".to_string(),
            message: "ready".to_string(),
            session: Map::new(),
            fields: Map::new(),
            spans: Vec::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["message"], "ready");
        assert!(json.get("session").is_none());
        assert!(json.get("fields").is_none());
        assert!(json.get("spans").is_none());
    }
}
