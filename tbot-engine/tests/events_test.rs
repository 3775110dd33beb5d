//! Integration tests for [`tbot_engine::EventRegistry`].
//!
//! Covers: late-subscriber replay, snapshot overwrite, identity
//! de-duplication, per-handler failure isolation and error re-publish, the
//! no-recursion guarantee for the `error` tag, and clear/off/destroy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tbot_core::{BotError, DispatchContext};
use tbot_engine::{EventDetails, EventHandler, EventRegistry};

/// Counts invocations and returns a fixed output.
struct CountingHandler {
    count: Arc<AtomicUsize>,
    output: Value,
}

impl CountingHandler {
    fn new(count: Arc<AtomicUsize>) -> Self {
        Self {
            count,
            output: Value::Null,
        }
    }

    fn with_output(count: Arc<AtomicUsize>, output: Value) -> Self {
        Self { count, output }
    }
}

#[async_trait::async_trait]
impl EventHandler for CountingHandler {
    async fn handle(
        &self,
        _data: Value,
        _details: EventDetails,
        _me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// Records `(event name, data)` pairs in invocation order.
struct RecordingHandler {
    log: Arc<Mutex<Vec<(String, Value)>>>,
}

#[async_trait::async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(
        &self,
        data: Value,
        details: EventDetails,
        _me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value> {
        self.log.lock().unwrap().push((details.name, data));
        Ok(Value::Null)
    }
}

/// Always fails.
struct FailingHandler {
    count: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl EventHandler for FailingHandler {
    async fn handle(
        &self,
        _data: Value,
        _details: EventDetails,
        _me: Option<DispatchContext>,
    ) -> tbot_core::Result<Value> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Err(BotError::Handler("boom".to_string()))
    }
}

/// **Test: A subscriber registered after a publish replays the last firing once,
/// then receives every later publish.**
///
/// **Setup:** Publish `greeting` with no subscribers, then subscribe.
/// **Action:** Publish `greeting` again.
/// **Expected:** Handler saw the replay plus the live publish (count 2), with the
/// replayed data equal to the first publish's data.
#[tokio::test]
async fn test_late_subscriber_replays_last_firing() {
    let registry = EventRegistry::new();
    registry
        .publish(&["greeting"], json!({ "n": 1 }), None)
        .await;

    let log = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(RecordingHandler { log: log.clone() });
    registry.on(&["greeting"], handler).await;

    {
        let seen = log.lock().unwrap();
        assert_eq!(seen.len(), 1, "replay fires exactly once");
        assert_eq!(seen[0], ("greeting".to_string(), json!({ "n": 1 })));
    }

    registry
        .publish(&["greeting"], json!({ "n": 2 }), None)
        .await;
    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].1, json!({ "n": 2 }));
}

/// **Test: The snapshot keeps only the latest publish.**
///
/// **Setup:** Publish `greeting` twice, then subscribe.
/// **Action:** none further.
/// **Expected:** The single replay carries the second publish's data.
#[tokio::test]
async fn test_snapshot_is_latest_overwrite() {
    let registry = EventRegistry::new();
    registry.publish(&["greeting"], json!({ "n": 1 }), None).await;
    registry.publish(&["greeting"], json!({ "n": 2 }), None).await;

    let log = Arc::new(Mutex::new(Vec::new()));
    registry
        .on(&["greeting"], Arc::new(RecordingHandler { log: log.clone() }))
        .await;

    let seen = log.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, json!({ "n": 2 }));
}

/// **Test: Subscribing the same handler twice is a no-op.**
///
/// **Setup:** One counting handler subscribed twice to `tick`.
/// **Action:** Publish `tick`.
/// **Expected:** count is 1.
#[tokio::test]
async fn test_duplicate_subscription_is_noop() {
    let registry = EventRegistry::new();
    let count = Arc::new(AtomicUsize::new(0));
    let handler: Arc<dyn EventHandler> = Arc::new(CountingHandler::new(count.clone()));

    registry.on(&["tick"], handler.clone()).await;
    registry.on(&["tick"], handler).await;
    registry.publish(&["tick"], Value::Null, None).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// **Test: A failing subscriber produces one `error` publish and does not stop
/// its siblings.**
///
/// **Setup:** A failing handler and a counting handler on `msg`; a recording
/// handler on `error`.
/// **Action:** Publish `msg`.
/// **Expected:** Sibling ran once; exactly one `error` event carrying the
/// failure text and the original data.
#[tokio::test]
async fn test_failing_handler_is_isolated_and_reported() {
    let registry = EventRegistry::new();
    let failures = Arc::new(AtomicUsize::new(0));
    let sibling = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(Mutex::new(Vec::new()));

    registry
        .on(&["msg"], Arc::new(FailingHandler { count: failures.clone() }))
        .await;
    registry
        .on(&["msg"], Arc::new(CountingHandler::new(sibling.clone())))
        .await;
    registry
        .on(&["error"], Arc::new(RecordingHandler { log: errors.clone() }))
        .await;

    registry.publish(&["msg"], json!({ "text": "hi" }), None).await;

    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(sibling.load(Ordering::SeqCst), 1);
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "error");
    assert_eq!(errors[0].1["data"], json!({ "text": "hi" }));
    assert!(errors[0].1["error"].as_str().unwrap().contains("boom"));
}

/// **Test: A failing `error` subscriber never recurses.**
///
/// **Setup:** A failing handler subscribed to `error`.
/// **Action:** Publish `error` once; then fail another event to trigger the
/// internal re-publish path.
/// **Expected:** The error handler ran once per firing (2 total), not
/// unboundedly.
#[tokio::test]
async fn test_error_tag_never_recurses() {
    let registry = EventRegistry::new();
    let error_runs = Arc::new(AtomicUsize::new(0));
    registry
        .on(&["error"], Arc::new(FailingHandler { count: error_runs.clone() }))
        .await;

    registry.publish(&["error"], json!({ "reason": "x" }), None).await;
    assert_eq!(error_runs.load(Ordering::SeqCst), 1);

    let msg_failures = Arc::new(AtomicUsize::new(0));
    registry
        .on(&["msg"], Arc::new(FailingHandler { count: msg_failures.clone() }))
        .await;
    registry.publish(&["msg"], Value::Null, None).await;

    assert_eq!(msg_failures.load(Ordering::SeqCst), 1);
    assert_eq!(error_runs.load(Ordering::SeqCst), 2);
}

/// **Test: publish returns successful outputs in registration order, skipping
/// failures.**
///
/// **Setup:** Handlers returning `{"a":1}`, a failing handler, and `{"a":2}`.
/// **Action:** Publish `update`.
/// **Expected:** Outputs are `[{"a":1}, {"a":2}]`.
#[tokio::test]
async fn test_publish_outputs_in_registration_order() {
    let registry = EventRegistry::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    registry
        .on(
            &["update"],
            Arc::new(CountingHandler::with_output(first, json!({ "a": 1 }))),
        )
        .await;
    registry
        .on(
            &["update"],
            Arc::new(FailingHandler { count: Arc::new(AtomicUsize::new(0)) }),
        )
        .await;
    registry
        .on(
            &["update"],
            Arc::new(CountingHandler::with_output(second, json!({ "a": 2 }))),
        )
        .await;

    let outputs = registry.publish(&["update"], Value::Null, None).await;
    assert_eq!(outputs, vec![json!({ "a": 1 }), json!({ "a": 2 })]);
}

/// **Test: clear drops the snapshot but keeps subscribers.**
///
/// **Setup:** Publish `greeting`, clear it, then subscribe.
/// **Action:** Publish again.
/// **Expected:** No replay on subscribe (count 0), live publish received
/// (count 1).
#[tokio::test]
async fn test_clear_stops_replay_only() {
    let registry = EventRegistry::new();
    registry.publish(&["greeting"], json!({ "n": 1 }), None).await;
    registry.clear("greeting");

    let count = Arc::new(AtomicUsize::new(0));
    registry
        .on(&["greeting"], Arc::new(CountingHandler::new(count.clone())))
        .await;
    assert_eq!(count.load(Ordering::SeqCst), 0, "no replay after clear");

    registry.publish(&["greeting"], json!({ "n": 2 }), None).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// **Test: off removes one subscriber; destroy removes the whole tag.**
///
/// **Setup:** Two counting handlers on `tick`.
/// **Action:** Remove one and publish; destroy the tag and publish.
/// **Expected:** After off only the second handler runs; after destroy neither
/// runs.
#[tokio::test]
async fn test_off_and_destroy() {
    let registry = EventRegistry::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let handler_one: Arc<dyn EventHandler> = Arc::new(CountingHandler::new(first.clone()));
    let handler_two: Arc<dyn EventHandler> = Arc::new(CountingHandler::new(second.clone()));

    registry.on(&["tick"], handler_one.clone()).await;
    registry.on(&["tick"], handler_two).await;

    registry.off("tick", &handler_one);
    registry.publish(&["tick"], Value::Null, None).await;
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);

    registry.destroy("tick");
    registry.publish(&["tick"], Value::Null, None).await;
    assert_eq!(second.load(Ordering::SeqCst), 1, "destroyed tag has no subscribers");
}

/// **Test: Subscribing to several tags at once registers on each.**
///
/// **Setup:** One counting handler on `["*", "text"]`.
/// **Action:** Publish both tags.
/// **Expected:** count 2.
#[tokio::test]
async fn test_multi_tag_subscription() {
    let registry = EventRegistry::new();
    let count = Arc::new(AtomicUsize::new(0));
    registry
        .on(&["*", "text"], Arc::new(CountingHandler::new(count.clone())))
        .await;

    registry.publish(&["*", "text"], json!({ "text": "hi" }), None).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}
