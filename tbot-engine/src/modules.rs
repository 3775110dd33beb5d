//! Named transform stages run over dispatch payloads.
//!
//! The dispatcher runs the `update` stage once per batch and the `message`
//! stage once per update; any other stage name is legal and simply never
//! runs until something calls [`ModulePipeline::run`] with it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// A synchronous, pure payload transform registered under a stage name.
pub type ModuleHook = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Ordered hooks per stage; [`run`](ModulePipeline::run) folds the payload
/// through them in registration order.
#[derive(Default)]
pub struct ModulePipeline {
    stages: Mutex<HashMap<String, Vec<ModuleHook>>>,
}

impl ModulePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `hook` to the stage unless that exact hook is already
    /// registered (Arc-identity de-duplication).
    pub fn register(&self, stage: &str, hook: ModuleHook) {
        let mut stages = self.stages.lock().unwrap();
        let list = stages.entry(stage.to_string()).or_default();
        if list.iter().any(|h| Arc::ptr_eq(h, &hook)) {
            return;
        }
        list.push(hook);
    }

    /// Applies the stage's hooks in registration order, each consuming the
    /// previous output. No hooks means the payload passes through unchanged;
    /// there is no skipping and no short-circuit.
    pub fn run(&self, stage: &str, payload: Value) -> Value {
        let hooks = {
            let stages = self.stages.lock().unwrap();
            stages.get(stage).cloned().unwrap_or_default()
        };
        hooks.iter().fold(payload, |acc, hook| hook(acc))
    }
}
