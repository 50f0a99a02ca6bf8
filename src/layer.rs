use crate::entry::LogEntry;
use crate::handler::LogHook;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::runtime::Handle;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::subscriber::NoSubscriber;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Target prefixes the layer never forwards: this crate and the HTTP stack
/// under `reqwest`. Connection tasks spawned by the client run outside the
/// delivery future and still report to the thread's subscriber.
const IGNORED_TARGETS: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    "reqwest",
    "hyper",
    "hyper_util",
    "h2",
    "rustls",
    "tokio_rustls",
    "want",
    "tower",
];

fn is_ignored_target(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|prefix| {
        target
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// `tracing_subscriber` layer that turns events into [`LogEntry`]s and
/// hands them to a [`LogHook`].
///
/// Only events whose level appears in [`LogHook::levels`] are forwarded.
/// Each one is delivered by its own task on the captured runtime; there is
/// no queue, no batching and no retry. Failed deliveries are counted and
/// reported with `tracing::warn!`.
///
/// Nothing emitted while a delivery runs is fed back into the hook: the
/// delivery future has no subscriber attached, and events from the HTTP
/// client's own targets are dropped.
pub struct HookLayer {
    hook: Arc<dyn LogHook>,
    runtime: Handle,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Entries the hook accepted.
    pub fired_events: Arc<AtomicU64>,
    /// Entries the hook failed to deliver.
    pub failed_events: Arc<AtomicU64>,
}

impl HookLayer {
    /// Create a layer that spawns deliveries onto `runtime`.
    pub fn new(hook: Arc<dyn LogHook>, runtime: Handle) -> Self {
        HookLayer {
            hook,
            runtime,
            total_events: Arc::new(AtomicU64::new(0)),
            fired_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<S> Layer<S> for HookLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if is_ignored_target(meta.target()) {
            return;
        }
        if !self.hook.levels().contains(meta.level()) {
            return;
        }

        let mut data = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut data, message: &mut message };
        event.record(&mut visitor);

        let entry = LogEntry {
            level: *meta.level(),
            message: message.unwrap_or_default(),
            data,
        };

        let hook = Arc::clone(&self.hook);
        let fired = Arc::clone(&self.fired_events);
        let failed = Arc::clone(&self.failed_events);
        self.runtime.spawn(async move {
            // Events raised while delivering must not become entries.
            let delivery = hook.fire(&entry).with_subscriber(NoSubscriber::default());
            match delivery.await {
                Ok(()) => {
                    fired.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %e, "failed to fire log hook");
                }
            }
        });
    }
}

/// Collects event fields into JSON values, routing `message` separately.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
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

    // `message` arrives here as `fmt::Arguments` from the event macros.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(text);
        } else {
            self.fields.insert(field.name().to_string(), Value::String(text));
        }
    }
}
