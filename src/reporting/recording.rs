use parking_lot::Mutex;

use super::{Properties, Reporter, StepId};

/// Snapshot of one step seen by a [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStep {
    pub id: StepId,
    pub name: String,
    pub properties: Properties,
    pub failed: bool,
    pub ended: bool,
}

/// In-memory reporter that keeps every step, in begin order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    steps: Mutex<Vec<RecordedStep>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<RecordedStep> {
        self.steps.lock().clone()
    }

    pub fn step_named(&self, name: &str) -> Option<RecordedStep> {
        self.steps.lock().iter().find(|s| s.name == name).cloned()
    }

    fn with_step(&self, id: StepId, f: impl FnOnce(&mut RecordedStep)) {
        if let Some(step) = self.steps.lock().iter_mut().find(|s| s.id == id) {
            f(step);
        }
    }
}

impl Reporter for RecordingReporter {
    fn begin_step(&self, name: &str, properties: &Properties) -> StepId {
        let mut steps = self.steps.lock();
        let id = StepId(steps.len() as u64 + 1);
        steps.push(RecordedStep {
            id,
            name: name.to_string(),
            properties: properties.clone(),
            failed: false,
            ended: false,
        });
        id
    }

    fn mark_failed(&self, step: StepId) {
        self.with_step(step, |s| s.failed = true);
    }

    fn edit_properties(&self, step: StepId, delta: &Properties) {
        self.with_step(step, |s| {
            for (key, value) in delta {
                s.properties.insert(key.clone(), value.clone());
            }
        });
    }

    fn end_step(&self, step: StepId) {
        self.with_step(step, |s| s.ended = true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edit_properties_merges() {
        let reporter = RecordingReporter::new();
        let mut props = Properties::new();
        props.insert("task_type".into(), json!("load"));
        let id = reporter.begin_step("Task: t1", &props);

        let mut delta = Properties::new();
        delta.insert("exc".into(), json!("boom"));
        reporter.edit_properties(id, &delta);

        let step = reporter.step_named("Task: t1").unwrap();
        assert_eq!(step.properties["task_type"], "load");
        assert_eq!(step.properties["exc"], "boom");
        assert!(!step.failed);
    }

    #[test]
    fn test_unknown_step_is_ignored() {
        let reporter = RecordingReporter::new();
        reporter.mark_failed(StepId(42));
        reporter.end_step(StepId(42));
        assert!(reporter.steps().is_empty());
    }
}
