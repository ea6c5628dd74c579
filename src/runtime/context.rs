use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    common::MemCache,
    events::{Event, HandlerLog},
    runtime::{Channel, ComponentHandle},
    utils,
};

/// Per-linkage execution context.
///
/// Carries the resolved source/target handles, the raw event data, the source
/// value payload, the engine environment table and the notification channel.
#[derive(Clone)]
pub struct LinkageContext {
    linkage_id: String,
    source: ComponentHandle,
    target: ComponentHandle,
    event_data: Value,
    source_value: Value,
    env: Arc<MemCache<String, String>>,
    channel: Arc<Channel>,
}

impl LinkageContext {
    pub fn new(
        linkage_id: String,
        source: ComponentHandle,
        target: ComponentHandle,
        event_data: Value,
        source_value: Value,
        env: Arc<MemCache<String, String>>,
        channel: Arc<Channel>,
    ) -> Self {
        Self {
            linkage_id,
            source,
            target,
            event_data,
            source_value,
            env,
            channel,
        }
    }

    pub fn linkage_id(&self) -> &str {
        &self.linkage_id
    }

    pub fn source(&self) -> &ComponentHandle {
        &self.source
    }

    pub fn target(&self) -> &ComponentHandle {
        &self.target
    }

    pub fn event_data(&self) -> &Value {
        &self.event_data
    }

    pub fn source_value(&self) -> &Value {
        &self.source_value
    }

    pub fn env(&self) -> Arc<MemCache<String, String>> {
        self.env.clone()
    }

    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    /// Environment table as a JSON object, for the handler `host` binding.
    pub fn env_snapshot(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in self.env.iter() {
            map.insert(k.as_str().to_string(), Value::String(v));
        }
        Value::Object(map)
    }

    /// Publish a diagnostic line on the handler log queue.
    pub fn emit_log(
        &self,
        content: String,
    ) {
        let log = HandlerLog {
            linkage_id: self.linkage_id.clone(),
            component_id: self.target.id(),
            content,
            timestamp: utils::time::time_millis(),
        };
        let _ = self.channel.log_queue().send(Event::new(&log));
    }
}
