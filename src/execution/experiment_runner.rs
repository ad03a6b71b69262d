//! # Experiment Runner
//!
//! Walks a [`WorkloadDefinition`] depth first in definition order. Each level
//! is wrapped in its own [`ExecutionScope`], and the first failure ends every
//! open scope as ERROR and skips everything scheduled after it.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::definition::{PhaseDefinition, SessionDefinition, TaskEntry, WorkloadDefinition};
use super::scope::{ExecutionScope, ScopeContext};
use super::workload_runner::WorkloadRunner;
use crate::config::TrackerConfig;
use crate::error::{ExecutionError, ExecutionResult, ScopeFailure, TrackerResult};
use crate::models::{Metadata, Phase, Session, Task, Workload};
use crate::persistence::PersistenceHandler;
use crate::reporting::{Properties, Reporter};

#[derive(Debug, Clone)]
pub struct ExperimentRunner {
    context: ScopeContext,
    workload_runner: WorkloadRunner,
}

impl ExperimentRunner {
    pub fn new(
        handler: PersistenceHandler,
        reporter: Arc<dyn Reporter>,
        workload_runner: WorkloadRunner,
    ) -> Self {
        Self {
            context: ScopeContext::new(handler, reporter),
            workload_runner,
        }
    }

    /// Connect to the configured store and build the runner around it
    pub async fn from_config(
        config: &TrackerConfig,
        reporter: Arc<dyn Reporter>,
    ) -> TrackerResult<Self> {
        config.validate()?;
        let handler = PersistenceHandler::connect(&config.database).await?;
        Ok(Self::new(
            handler,
            reporter,
            WorkloadRunner::from_config(config),
        ))
    }

    pub fn handler(&self) -> &PersistenceHandler {
        &self.context.handler
    }

    pub fn workload_runner(&self) -> &WorkloadRunner {
        &self.workload_runner
    }

    /// Execute the whole workload and return its ended component.
    pub async fn run(&self, definition: WorkloadDefinition) -> ExecutionResult<Workload> {
        self.context.handler.ensure_schema().await?;

        let WorkloadDefinition { name, phases } = definition;
        info!(workload = %name, phases = phases.len(), "Starting workload");

        let scope = ExecutionScope::<Workload>::open_workload(&self.context, &name).await?;
        let outcome = self.run_phases(scope.component(), phases).await;
        scope.close(outcome).await
    }

    async fn run_phases(
        &self,
        workload: &Workload,
        phases: Vec<PhaseDefinition>,
    ) -> ExecutionResult<()> {
        let count = phases.len();
        for (phase_index, phase) in phases.into_iter().enumerate() {
            let metadata = position(&[("phase_index", phase_index)]);
            let scope = ExecutionScope::<Phase>::open_child(
                &self.context,
                workload,
                &phase.name,
                (),
                &metadata,
                &Properties::new(),
            )
            .await?;
            let outcome = self
                .run_sessions(scope.component(), phase_index, phase.sessions)
                .await;
            scope.close(outcome).await?;
        }

        info!(workload = %workload.record.name, "All {count} phases finished");
        Ok(())
    }

    async fn run_sessions(
        &self,
        phase: &Phase,
        phase_index: usize,
        sessions: Vec<SessionDefinition>,
    ) -> ExecutionResult<()> {
        let count = sessions.len();
        for (session_index, session) in sessions.into_iter().enumerate() {
            let metadata = position(&[
                ("phase_index", phase_index),
                ("session_index", session_index),
            ]);
            let scope = ExecutionScope::<Session>::open_child(
                &self.context,
                phase,
                &session.name,
                (),
                &metadata,
                &Properties::new(),
            )
            .await?;
            let outcome = self
                .run_tasks(scope.component(), phase_index, session_index, session.tasks)
                .await;
            scope.close(outcome).await?;
        }

        info!(phase = %phase.record.name, "All {count} sessions finished");
        Ok(())
    }

    async fn run_tasks(
        &self,
        session: &Session,
        phase_index: usize,
        session_index: usize,
        tasks: Vec<TaskEntry>,
    ) -> ExecutionResult<()> {
        let count = tasks.len();
        for (task_index, mut entry) in tasks.into_iter().enumerate() {
            let metadata = position(&[
                ("phase_index", phase_index),
                ("session_index", session_index),
                ("task_index", task_index),
            ]);
            let mut properties = Properties::new();
            properties.insert("task_type".to_string(), json!(entry.task_type().as_str()));

            let scope = ExecutionScope::<Task>::open_child(
                &self.context,
                session,
                &entry.display_name(),
                entry.task_type(),
                &metadata,
                &properties,
            )
            .await?;
            let outcome = self
                .workload_runner
                .run_and_wait(entry.task.as_mut())
                .await
                .map_err(|cause| ExecutionError::from(ScopeFailure::new(scope.record(), cause)));
            scope.close(outcome).await?;
        }

        info!(session = %session.record.name, "All {count} tasks executed");
        Ok(())
    }
}

fn position(indices: &[(&str, usize)]) -> Metadata {
    indices
        .iter()
        .map(|(key, index)| ((*key).to_string(), Value::from(*index)))
        .collect()
}
