//! Declarative workload definitions consumed by the experiment runner.

use std::fmt;

use super::runnable::{BenchmarkTask, Runnable, TaskShape};
use crate::models::TaskType;

/// A runnable task plus the naming needed to track it
pub struct TaskEntry {
    pub task: Box<dyn Runnable>,
    task_type: TaskType,
    name: Option<String>,
    label: String,
}

impl TaskEntry {
    /// Wrap a task; its type and label come from the task itself.
    pub fn new<R: Runnable + TaskShape + 'static>(task: R) -> Self {
        Self {
            task_type: task.task_type(),
            label: task.label(),
            task: Box::new(task),
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit name, otherwise `<task_type>_<label>`
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}_{}", self.task_type, self.label),
        }
    }
}

impl From<BenchmarkTask> for TaskEntry {
    fn from(task: BenchmarkTask) -> Self {
        TaskEntry::new(task)
    }
}

impl fmt::Debug for TaskEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEntry")
            .field("task_type", &self.task_type)
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Ordered tasks forming one logical unit of work
#[derive(Debug)]
pub struct SessionDefinition {
    pub name: String,
    pub tasks: Vec<TaskEntry>,
}

impl SessionDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn task(mut self, task: impl Into<TaskEntry>) -> Self {
        self.tasks.push(task.into());
        self
    }
}

#[derive(Debug)]
pub struct PhaseDefinition {
    pub name: String,
    pub sessions: Vec<SessionDefinition>,
}

impl PhaseDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sessions: Vec::new(),
        }
    }

    pub fn session(mut self, session: SessionDefinition) -> Self {
        self.sessions.push(session);
        self
    }
}

/// Root of a workload definition: phases run in order
#[derive(Debug)]
pub struct WorkloadDefinition {
    pub name: String,
    pub phases: Vec<PhaseDefinition>,
}

impl WorkloadDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
        }
    }

    pub fn phase(mut self, phase: PhaseDefinition) -> Self {
        self.phases.push(phase);
        self
    }

    /// Number of task entries across every phase and session
    pub fn task_count(&self) -> usize {
        self.phases
            .iter()
            .flat_map(|p| &p.sessions)
            .map(|s| s.tasks.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::error::TaskError;
    use crate::execution::runnable::SpawnedJob;
    use async_trait::async_trait;
    use std::time::Duration;

    struct VacuumTables;

    #[async_trait]
    impl Runnable for VacuumTables {
        async fn run(&mut self, _host: Option<&HostConfig>) -> Result<(), TaskError> {
            Ok(())
        }

        async fn wait(&mut self, _timeout: Duration) -> Result<(), TaskError> {
            Ok(())
        }
    }

    impl TaskShape for VacuumTables {
        fn task_type(&self) -> TaskType {
            TaskType::DataMaintenance
        }
    }

    #[test]
    fn test_default_name_uses_type_and_label() {
        let entry = TaskEntry::new(VacuumTables);
        assert_eq!(entry.task_type(), TaskType::DataMaintenance);
        assert_eq!(entry.label(), "VacuumTables");
        assert_eq!(entry.display_name(), "data_maintenance_VacuumTables");

        let entry = entry.named("nightly vacuum");
        assert_eq!(entry.display_name(), "nightly vacuum");
    }

    #[test]
    fn test_benchmark_task_entry_takes_job_label() {
        let job = SpawnedJob::new("tpch_q1", |_host: Option<HostConfig>| async { Ok(()) });
        let entry: TaskEntry = BenchmarkTask::SingleUser(job).into();
        assert_eq!(entry.task_type(), TaskType::SingleUser);
        assert_eq!(entry.display_name(), "single_user_tpch_q1");
    }

    #[test]
    fn test_benchmark_task_through_new_keeps_its_own_shape() {
        let job = SpawnedJob::new("compact_orders", |_host: Option<HostConfig>| async { Ok(()) });
        let entry = TaskEntry::new(BenchmarkTask::Optimize(job));

        assert_eq!(entry.task_type(), TaskType::Optimize);
        assert_eq!(entry.label(), "compact_orders");
        assert_eq!(entry.name(), None);
        assert_eq!(entry.display_name(), "optimize_compact_orders");
    }

    #[test]
    fn test_builder_preserves_order() {
        let definition = WorkloadDefinition::new("tpch")
            .phase(
                PhaseDefinition::new("load").session(
                    SessionDefinition::new("s0")
                        .task(TaskEntry::new(VacuumTables).named("a"))
                        .task(TaskEntry::new(VacuumTables).named("b")),
                ),
            )
            .phase(PhaseDefinition::new("power"));

        assert_eq!(definition.phases[0].name, "load");
        assert_eq!(definition.phases[1].name, "power");
        let names: Vec<_> = definition.phases[0].sessions[0]
            .tasks
            .iter()
            .map(TaskEntry::display_name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(definition.task_count(), 2);
    }
}
