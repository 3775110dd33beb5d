//! Named-event registry: ordered subscribers, last-fired snapshot replay,
//! and isolated concurrent fan-out.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::error;

use tbot_core::DispatchContext;

/// Passed to every handler invocation alongside the event data.
#[derive(Debug, Clone)]
pub struct EventDetails {
    /// Event tag this invocation was published under.
    pub name: String,
    /// Publish time.
    pub time: DateTime<Utc>,
}

/// A subscriber. The return value is merged into the dispatch context for
/// the `update` event; other events ignore it (return `Value::Null`).
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(
        &self,
        data: Value,
        details: EventDetails,
        me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value>;
}

/// Adapter so plain async closures can subscribe without a named struct.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(Value, EventDetails, Option<DispatchContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = tbot_core::Result<Value>> + Send + 'static,
{
    async fn handle(
        &self,
        data: Value,
        details: EventDetails,
        me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value> {
        (self.0)(data, details, me).await
    }
}

/// The latest publish retained per tag, replayed to late subscribers.
struct FiredEvent {
    data: Value,
    details: EventDetails,
    me: Option<DispatchContext>,
}

#[derive(Default)]
struct EventRecord {
    fired: Option<FiredEvent>,
    list: Vec<Arc<dyn EventHandler>>,
}

/// Registry of named events. Subscribers are kept in registration order and
/// de-duplicated by identity; each tag retains at most one fired snapshot.
#[derive(Default)]
pub struct EventRegistry {
    events: Mutex<HashMap<String, EventRecord>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to one or more tags. If a tag has already fired,
    /// the handler immediately observes the last occurrence (replay) before
    /// being appended; a failing replay is re-published under `error` unless
    /// the tag itself is `error`. Subscribing the same handler twice to one
    /// tag is a no-op.
    pub async fn on(&self, names: &[&str], handler: Arc<dyn EventHandler>) {
        for name in names {
            let replay = {
                let mut events = self.events.lock().unwrap();
                let record = events.entry(name.to_string()).or_default();
                record
                    .fired
                    .as_ref()
                    .map(|f| (f.data.clone(), f.details.clone(), f.me.clone()))
            };

            if let Some((data, details, me)) = replay {
                if let Err(err) = handler.handle(data.clone(), details, me).await {
                    error!(event = %name, error = %err, "replayed handler failed");
                    if *name != "error" {
                        self.emit_error(json!({ "error": err.to_string(), "data": data }))
                            .await;
                    }
                }
            }

            let mut events = self.events.lock().unwrap();
            let record = events.entry(name.to_string()).or_default();
            if !record.list.iter().any(|h| Arc::ptr_eq(h, &handler)) {
                record.list.push(handler.clone());
            }
        }
    }

    /// Publishes `data` under each tag. Subscribers are started in
    /// registration order and awaited jointly; a failing subscriber is
    /// re-published as an `error` event (unless the tag IS `error`) and
    /// never blocks its siblings. Returns only after every invocation has
    /// settled, with the successful outputs in registration order.
    pub async fn publish(
        &self,
        names: &[&str],
        data: Value,
        me: Option<&DispatchContext>,
    ) -> Vec<Value> {
        let mut outputs = Vec::new();
        for name in names {
            let details = EventDetails {
                name: name.to_string(),
                time: Utc::now(),
            };

            let handlers = {
                let mut events = self.events.lock().unwrap();
                let record = events.entry(name.to_string()).or_default();
                record.fired = Some(FiredEvent {
                    data: data.clone(),
                    details: details.clone(),
                    me: me.cloned(),
                });
                record.list.clone()
            };
            if handlers.is_empty() {
                continue;
            }

            let runs = handlers.into_iter().map(|handler| {
                let data = data.clone();
                let details = details.clone();
                let me = me.cloned();
                async move { handler.handle(data, details, me).await }
            });
            for outcome in join_all(runs).await {
                match outcome {
                    Ok(output) => outputs.push(output),
                    Err(err) => {
                        error!(event = %name, error = %err, "event handler failed");
                        if *name != "error" {
                            self.emit_error(
                                json!({ "error": err.to_string(), "data": data.clone() }),
                            )
                            .await;
                        }
                    }
                }
            }
        }
        outputs
    }

    /// Publishes to the `error` tag without re-entering the failure path: a
    /// failing error-subscriber is only logged, so the tag can never recurse.
    async fn emit_error(&self, payload: Value) {
        let details = EventDetails {
            name: "error".to_string(),
            time: Utc::now(),
        };

        let handlers = {
            let mut events = self.events.lock().unwrap();
            let record = events.entry("error".to_string()).or_default();
            record.fired = Some(FiredEvent {
                data: payload.clone(),
                details: details.clone(),
                me: None,
            });
            record.list.clone()
        };

        let runs = handlers.into_iter().map(|handler| {
            let data = payload.clone();
            let details = details.clone();
            async move { handler.handle(data, details, None).await }
        });
        for outcome in join_all(runs).await {
            if let Err(err) = outcome {
                error!(error = %err, "error handler failed");
            }
        }
    }

    /// Drops the fired snapshot for `name`; subscribers stay registered and
    /// future latecomers get no replay until the tag fires again.
    pub fn clear(&self, name: &str) {
        if let Some(record) = self.events.lock().unwrap().get_mut(name) {
            record.fired = None;
        }
    }

    /// Removes one subscriber by identity.
    pub fn off(&self, name: &str, handler: &Arc<dyn EventHandler>) {
        if let Some(record) = self.events.lock().unwrap().get_mut(name) {
            record.list.retain(|h| !Arc::ptr_eq(h, handler));
        }
    }

    /// Removes the tag entirely: subscribers and snapshot.
    pub fn destroy(&self, name: &str) {
        self.events.lock().unwrap().remove(name);
    }
}
