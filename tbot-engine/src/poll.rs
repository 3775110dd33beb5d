//! Timer-driven poll loop: fetch, dispatch, and retry with backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{error, info};

use tbot_core::{BotConfig, UpdateSource};

use crate::dispatch::Dispatcher;
use crate::events::{EventHandler, EventRegistry};
use crate::modules::{ModuleHook, ModulePipeline};

/// Cadence knobs for the loop, usually taken from [`BotConfig`]. The poll
/// interval paces healthy fetches; the retry timeout spaces re-attempts
/// after a failed one; `timeout` is the long-poll wait forwarded to the
/// server. Three different things, three fields.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub limit: u32,
    pub timeout: u64,
    pub poll_interval: Duration,
    pub retry_timeout: Duration,
}

impl From<&BotConfig> for PollSettings {
    fn from(config: &BotConfig) -> Self {
        Self {
            limit: config.limit,
            timeout: config.timeout,
            poll_interval: config.poll_interval(),
            retry_timeout: config.retry_timeout(),
        }
    }
}

/// The engine: owns the registry, pipeline and dispatcher, and drives the
/// tick → fetch → dispatch loop. At most one fetch is in flight at any
/// time; the busy flag is the only serialization primitive. Cloning is
/// cheap and shares all state, so a clone can move into a spawned task.
#[derive(Clone)]
pub struct BotEngine {
    settings: PollSettings,
    source: Arc<dyn UpdateSource>,
    events: Arc<EventRegistry>,
    modules: Arc<ModulePipeline>,
    dispatcher: Arc<Dispatcher>,
    running: Arc<AtomicBool>,
    busy: Arc<AtomicBool>,
    retry_started: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl BotEngine {
    pub fn new(settings: PollSettings, source: Arc<dyn UpdateSource>) -> Self {
        let events = Arc::new(EventRegistry::new());
        let modules = Arc::new(ModulePipeline::new());
        let dispatcher = Arc::new(Dispatcher::new(events.clone(), modules.clone()));
        Self {
            settings,
            source,
            events,
            modules,
            dispatcher,
            running: Arc::new(AtomicBool::new(false)),
            busy: Arc::new(AtomicBool::new(false)),
            retry_started: Arc::new(Mutex::new(None)),
        }
    }

    pub fn events(&self) -> &Arc<EventRegistry> {
        &self.events
    }

    pub fn modules(&self) -> &Arc<ModulePipeline> {
        &self.modules
    }

    /// Next update_id the loop will request.
    pub fn cursor(&self) -> i64 {
        self.dispatcher.cursor()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribes a handler, with late-subscriber replay. See
    /// [`EventRegistry::on`].
    pub async fn on(&self, names: &[&str], handler: Arc<dyn EventHandler>) {
        self.events.on(names, handler).await;
    }

    /// Registers a module hook for a dispatch stage (`update` or `message`).
    pub fn module(&self, stage: &str, hook: ModuleHook) {
        self.modules.register(stage, hook);
    }

    /// Starts ticking: publishes `connect` once and spawns the loop task.
    /// `stop` ends the loop at the next tick boundary; in-flight fetches are
    /// never preempted.
    pub async fn start(&self) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        info!("bot started");
        self.events.publish(&["connect"], Value::Null, None).await;

        let engine = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.settings.poll_interval);
            loop {
                ticker.tick().await;
                if !engine.running.load(Ordering::SeqCst) {
                    break;
                }
                if engine
                    .busy
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    continue;
                }
                let engine = engine.clone();
                tokio::spawn(async move { engine.poll_once().await });
            }
        })
    }

    /// Stops ticking at the next tick boundary and publishes `disconnect`
    /// with the optional reason.
    pub async fn stop(&self, reason: Option<&str>) {
        self.running.store(false, Ordering::SeqCst);
        info!(reason = reason.unwrap_or(""), "bot disconnected");
        let data = reason
            .map(|r| Value::String(r.to_string()))
            .unwrap_or(Value::Null);
        self.events.publish(&["disconnect"], data, None).await;
    }

    /// One fetch cycle. Success closes any open retry streak (publishing
    /// `reconnected` with the streak bounds) and publishes `tick`; failure
    /// opens the streak, publishes `error` then `reconnecting`, and holds
    /// the busy flag for the retry timeout so the next attempt is spaced
    /// independently of the steady-state cadence.
    async fn poll_once(&self) {
        match self.fetch_and_dispatch().await {
            Ok(()) => {
                let streak = self.retry_started.lock().unwrap().take();
                if let Some(start) = streak {
                    let end = Utc::now();
                    let diff = (end - start).num_milliseconds() as f64 / 1000.0;
                    info!(seconds = diff, "reconnected");
                    self.events
                        .publish(
                            &["reconnected"],
                            json!({
                                "startTime": start.timestamp_millis(),
                                "endTime": end.timestamp_millis(),
                                "diffTime": diff,
                            }),
                            None,
                        )
                        .await;
                }
                self.events.publish(&["tick"], Value::Null, None).await;
                self.busy.store(false, Ordering::SeqCst);
            }
            Err(err) => {
                {
                    let mut streak = self.retry_started.lock().unwrap();
                    if streak.is_none() {
                        *streak = Some(Utc::now());
                    }
                }
                error!(error = %err, "update fetch failed");
                self.events
                    .publish(&["error"], json!({ "error": err.to_string() }), None)
                    .await;
                info!(
                    seconds = self.settings.retry_timeout.as_secs_f64(),
                    "reconnecting"
                );
                self.events
                    .publish(&["reconnecting"], Value::Null, None)
                    .await;
                tokio::time::sleep(self.settings.retry_timeout).await;
                self.busy.store(false, Ordering::SeqCst);
            }
        }
    }

    async fn fetch_and_dispatch(&self) -> tbot_core::Result<()> {
        let batch = self
            .source
            .fetch_updates(
                self.dispatcher.cursor(),
                self.settings.limit,
                self.settings.timeout,
            )
            .await?;
        self.dispatcher.dispatch(batch).await;
        Ok(())
    }
}
