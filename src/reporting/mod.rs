//! # Step Reporting
//!
//! Observability sink that execution scopes bracket their bodies with. A
//! reporter receives step begin/fail/property events and cannot influence
//! control flow: none of its methods return errors, and implementations are
//! expected to swallow their own failures.

pub mod recording;

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub use recording::{RecordedStep, RecordingReporter};

/// Free-form step properties
pub type Properties = serde_json::Map<String, Value>;

/// Identifier a reporter hands out for a begun step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId(pub u64);

pub trait Reporter: Send + Sync + fmt::Debug {
    fn begin_step(&self, name: &str, properties: &Properties) -> StepId;

    fn mark_failed(&self, step: StepId);

    fn edit_properties(&self, step: StepId, delta: &Properties);

    fn end_step(&self, step: StepId);
}

/// A begun step; ends itself on drop.
#[derive(Debug)]
pub struct ReportStep {
    reporter: Arc<dyn Reporter>,
    id: StepId,
}

impl ReportStep {
    pub fn begin(reporter: Arc<dyn Reporter>, name: &str, properties: &Properties) -> Self {
        let id = reporter.begin_step(name, properties);
        Self { reporter, id }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn failed(&self) {
        self.reporter.mark_failed(self.id);
    }

    pub fn edit_properties(&self, delta: &Properties) {
        self.reporter.edit_properties(self.id, delta);
    }
}

impl Drop for ReportStep {
    fn drop(&mut self) {
        self.reporter.end_step(self.id);
    }
}

/// Reporter that discards every event
#[derive(Debug, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn begin_step(&self, _name: &str, _properties: &Properties) -> StepId {
        StepId(0)
    }

    fn mark_failed(&self, _step: StepId) {}

    fn edit_properties(&self, _step: StepId, _delta: &Properties) {}

    fn end_step(&self, _step: StepId) {}
}

/// Reporter that emits step events as structured log lines
#[derive(Debug, Default)]
pub struct TracingReporter {
    next_id: AtomicU64,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for TracingReporter {
    fn begin_step(&self, name: &str, properties: &Properties) -> StepId {
        let id = StepId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let properties = Value::Object(properties.clone());
        info!(
            step_id = id.0,
            step = %name,
            properties = %properties,
            "STEP_BEGIN"
        );
        id
    }

    fn mark_failed(&self, step: StepId) {
        warn!(step_id = step.0, "STEP_FAILED");
    }

    fn edit_properties(&self, step: StepId, delta: &Properties) {
        let delta = Value::Object(delta.clone());
        info!(
            step_id = step.0,
            delta = %delta,
            "STEP_PROPERTIES"
        );
    }

    fn end_step(&self, step: StepId) {
        info!(step_id = step.0, "STEP_END");
    }
}
