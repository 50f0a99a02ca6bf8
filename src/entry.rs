use serde_json::Value;
use std::collections::BTreeMap;
use tracing::Level;

/// Data key whose value is copied verbatim into the payload's `route`.
pub const ROUTE_KEY: &str = "route";

/// Data key whose value is marshaled separately into `request_param`.
pub const REQUEST_PARAM_KEY: &str = "request_param";

/// A single log record handed to a hook.
///
/// Only `message` and the two reserved `data` keys ([`ROUTE_KEY`],
/// [`REQUEST_PARAM_KEY`]) end up on the wire; `level` is what the layer
/// matched against the hook's levels.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub data: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogEntry {
            level,
            message: message.into(),
            data: BTreeMap::new(),
        }
    }

    /// Attach a structured value under `key`, replacing any previous one.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn route(&self) -> Option<&Value> {
        self.data.get(ROUTE_KEY)
    }

    pub fn request_param(&self) -> Option<&Value> {
        self.data.get(REQUEST_PARAM_KEY)
    }
}
