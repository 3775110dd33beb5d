//! Batch classification: context merge, module stages, type and command
//! events, cursor advance.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use tbot_core::{active_payload, DispatchContext, Update, MESSAGE_TYPES};

use crate::events::EventRegistry;
use crate::modules::ModulePipeline;

static CMD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/(\w+)").unwrap());

/// Classifies fetched batches into events and advances the update cursor.
/// Classification has no failure mode: an absent field is skipped, never an
/// error.
pub struct Dispatcher {
    events: Arc<EventRegistry>,
    modules: Arc<ModulePipeline>,
    cursor: AtomicI64,
}

impl Dispatcher {
    pub fn new(events: Arc<EventRegistry>, modules: Arc<ModulePipeline>) -> Self {
        Self {
            events,
            modules,
            cursor: AtomicI64::new(0),
        }
    }

    /// Next update_id to request: one past the highest id seen so far.
    /// Never decreases, whatever order updates arrive in within a batch.
    pub fn cursor(&self) -> i64 {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Processes one fetched batch. An empty batch is a no-op: no events
    /// fire and the cursor is untouched.
    pub async fn dispatch(&self, batch: Vec<Update>) {
        if batch.is_empty() {
            return;
        }
        debug!(count = batch.len(), "dispatching update batch");

        let data = serde_json::to_value(&batch).unwrap_or(Value::Null);
        let outputs = self.events.publish(&["update"], data.clone(), None).await;
        let mut me = DispatchContext::new();
        for output in outputs {
            me.merge(output);
        }

        let staged = self
            .modules
            .run("update", json!({ "data": data, "me": me.as_value() }));
        let data = staged
            .get("data")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let mut me = context_from(staged.get("me"));

        let updates = data.as_array().cloned().unwrap_or_default();
        for update in updates {
            let next_id = update.get("update_id").and_then(Value::as_i64).unwrap_or(0) + 1;
            self.cursor.fetch_max(next_id, Ordering::SeqCst);

            let staged = self.modules.run(
                "message",
                json!({ "me": me.as_value(), "msg": active_payload(&update) }),
            );
            let msg = staged
                .get("msg")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            me = context_from(staged.get("me"));

            for tag in MESSAGE_TYPES {
                if msg.get(tag).is_none() {
                    continue;
                }
                me.set("type", Value::String(tag.to_string()));
                self.events.publish(&["*", tag], msg.clone(), Some(&me)).await;

                if tag != "text" {
                    continue;
                }
                let Some(text) = msg.get("text").and_then(Value::as_str) else {
                    continue;
                };
                let Some(found) = CMD_RE.captures(text) else {
                    continue;
                };
                let tokens: Vec<Value> = text
                    .split_whitespace()
                    .map(|t| Value::String(t.to_string()))
                    .collect();
                me.set("cmd", Value::Array(tokens));
                let command = format!("/{}", &found[1]);
                self.events
                    .publish(&["/*", &command], msg.clone(), Some(&me))
                    .await;
            }
        }
    }
}

fn context_from(value: Option<&Value>) -> DispatchContext {
    value
        .cloned()
        .map(DispatchContext::from_value)
        .unwrap_or_default()
}
