use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::broadcast;
use tracing::field::{Field, Visit};

/// How many recent log lines a new SSE subscriber is replayed.
pub(crate) const RING_CAPACITY: usize = 500;

pub(crate) type LogRing = Arc<Mutex<VecDeque<String>>>;

/// Mirrors every event as one JSON line into a bounded ring and a broadcast
/// channel that feeds `/api/logs`.
pub(crate) struct BroadcastLayer {
    pub tx: broadcast::Sender<String>,
    pub ring: LogRing,
}

/// Collects the message and the structured fields of one event.
#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: serde_json::Map<String, serde_json::Value>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().into(), value.into());
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().into(), value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().into(), value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().into(), value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let mut text = format!("{value:?}");
        // Debug on &str adds quotes
        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            text = text[1..text.len() - 1].to_string();
        }
        if field.name() == "message" {
            self.message = text;
        } else {
            self.fields.insert(field.name().into(), text.into());
        }
    }
}

fn category(target: &str) -> &'static str {
    if target.contains("flow") || target.contains("analyze") {
        "flow"
    } else if target.contains("llm") {
        "llm"
    } else if target.contains("tower_http") {
        "http"
    } else {
        "system"
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for BroadcastLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => "err",
            tracing::Level::WARN => "warn",
            tracing::Level::INFO => "info",
            tracing::Level::DEBUG => "debug",
            tracing::Level::TRACE => return,
        };

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let json = serde_json::json!({
            "ts": chrono::Utc::now().timestamp(),
            "level": level,
            "category": category(event.metadata().target()),
            "message": visitor.message,
            "fields": visitor.fields,
        })
        .to_string();

        let _ = self.tx.send(json.clone());
        if let Ok(mut ring) = self.ring.lock() {
            ring.push_back(json);
            if ring.len() > RING_CAPACITY {
                ring.pop_front();
            }
        }
    }
}

/// Lines currently held by the ring, oldest first.
pub(crate) fn snapshot(ring: &LogRing) -> Vec<String> {
    ring.lock().map(|r| r.iter().cloned().collect()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[test]
    fn events_become_json_lines() {
        let (tx, mut rx) = broadcast::channel(16);
        let ring: LogRing = Arc::default();
        let layer = BroadcastLayer {
            tx,
            ring: ring.clone(),
        };
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "lawlens_core::flow", flow = "parse-document", output_len = 42u64, "flow completed");
            tracing::trace!("dropped");
        });

        let line = rx.try_recv().unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["level"], "info");
        assert_eq!(v["category"], "flow");
        assert_eq!(v["message"], "flow completed");
        assert_eq!(v["fields"]["flow"], "parse-document");
        assert_eq!(v["fields"]["output_len"], 42);
        assert!(rx.try_recv().is_err());
        assert_eq!(snapshot(&ring), vec![line]);
    }

    #[test]
    fn ring_is_bounded() {
        let (tx, _rx) = broadcast::channel(4);
        let ring: LogRing = Arc::default();
        let subscriber = tracing_subscriber::registry().with(BroadcastLayer {
            tx,
            ring: ring.clone(),
        });

        tracing::subscriber::with_default(subscriber, || {
            for i in 0..RING_CAPACITY + 10 {
                tracing::warn!(target: "lawlens_llm::gemini", "line {i}");
            }
        });

        let lines = snapshot(&ring);
        assert_eq!(lines.len(), RING_CAPACITY);
        assert!(lines[0].contains("line 10"));
        assert!(lines[0].contains(r#""category":"llm""#));
    }
}
