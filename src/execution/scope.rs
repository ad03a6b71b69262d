//! # Execution Scopes
//!
//! `ExecutionScope<C>` is the create -> start -> body -> end lifecycle for one
//! level of the hierarchy. A scope is opened against an already started parent,
//! the caller runs its body with the live component, and `close` persists the
//! outcome.
//!
//! Failures are values: a task body failure becomes a [`ScopeFailure`](crate::error::ScopeFailure) once, at
//! the task scope, and every enclosing `close` ends its own component as ERROR
//! before handing the same value up unchanged.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ExecutionError, ExecutionResult};
use crate::logging::{log_error, log_scope_transition};
use crate::models::{ChildComponent, Component, ComponentRecord, ComponentType, Metadata, Workload};
use crate::persistence::PersistenceHandler;
use crate::reporting::{Properties, ReportStep, Reporter};
use crate::state_machine::ExecutionStatus;

/// Collaborators shared by every scope of a run
#[derive(Debug, Clone)]
pub struct ScopeContext {
    pub handler: PersistenceHandler,
    pub reporter: Arc<dyn Reporter>,
}

impl ScopeContext {
    pub fn new(handler: PersistenceHandler, reporter: Arc<dyn Reporter>) -> Self {
        Self { handler, reporter }
    }
}

/// A started component bracketed by a reporter step.
#[derive(Debug)]
pub struct ExecutionScope<C: Component> {
    handler: PersistenceHandler,
    component: C,
    step: ReportStep,
}

impl ExecutionScope<Workload> {
    pub async fn open_workload(context: &ScopeContext, name: &str) -> ExecutionResult<Self> {
        Self::open(context, name, (), None, &Metadata::new(), &Properties::new()).await
    }
}

impl<C: Component> ExecutionScope<C> {
    /// Open a scope underneath a running `parent`.
    pub async fn open_child(
        context: &ScopeContext,
        parent: &C::Parent,
        name: &str,
        init: C::Init,
        metadata: &Metadata,
        properties: &Properties,
    ) -> ExecutionResult<Self>
    where
        C: ChildComponent,
    {
        Self::open(
            context,
            name,
            init,
            Some(parent.record()),
            metadata,
            properties,
        )
        .await
    }

    async fn open(
        context: &ScopeContext,
        name: &str,
        init: C::Init,
        parent: Option<&ComponentRecord>,
        metadata: &Metadata,
        properties: &Properties,
    ) -> ExecutionResult<Self> {
        let kind = C::COMPONENT_TYPE;
        let step = ReportStep::begin(
            Arc::clone(&context.reporter),
            &step_name(kind, name),
            properties,
        );

        let opened = async {
            let mut component = context.handler.create::<C>(name, init).await?;
            context
                .handler
                .start(&mut component, parent, metadata)
                .await?;
            Ok::<C, ExecutionError>(component)
        }
        .await;

        match opened {
            Ok(component) => {
                log_scope_transition(
                    kind,
                    component.name(),
                    component.uuid(),
                    component.status(),
                    None,
                );
                Ok(Self {
                    handler: context.handler.clone(),
                    component,
                    step,
                })
            }
            Err(err) => {
                let message = err.to_string();
                log_error(kind.as_str(), "open", &message, Some(name));
                step.failed();
                step.edit_properties(&exc_property(&message));
                Err(err)
            }
        }
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn record(&self) -> &ComponentRecord {
        self.component.record()
    }

    /// End the component according to `outcome`.
    ///
    /// Success ends it FINISHED with no error message. A failure ends it
    /// ERROR with the message recorded for this scope and is returned
    /// unchanged, unless the end write itself fails. A failed end write always
    /// marks the step failed.
    pub async fn close(self, outcome: ExecutionResult<()>) -> ExecutionResult<C> {
        let Self {
            handler,
            mut component,
            step,
        } = self;
        let kind = C::COMPONENT_TYPE;

        match outcome {
            Ok(()) => {
                if let Err(end_err) = handler
                    .end(&mut component, ExecutionStatus::Finished, None)
                    .await
                {
                    let message = end_err.to_string();
                    log_error(kind.as_str(), "close", &message, Some(component.name()));
                    step.failed();
                    step.edit_properties(&exc_property(&message));
                    return Err(end_err.into());
                }
                log_scope_transition(
                    kind,
                    component.name(),
                    component.uuid(),
                    component.status(),
                    None,
                );
                Ok(component)
            }
            Err(err) => {
                let message = err.message_for(component.uuid());
                step.failed();
                step.edit_properties(&exc_property(&message));

                if let Err(end_err) = handler
                    .end(&mut component, ExecutionStatus::Error, Some(&message))
                    .await
                {
                    log_error(
                        kind.as_str(),
                        "close",
                        &end_err.to_string(),
                        Some(&message),
                    );
                    return Err(end_err.into());
                }

                log_scope_transition(
                    kind,
                    component.name(),
                    component.uuid(),
                    component.status(),
                    Some(&message),
                );
                debug!(uuid = %component.uuid(), "Propagating failure to enclosing scope");
                Err(err)
            }
        }
    }
}

fn step_name(kind: ComponentType, name: &str) -> String {
    let title = match kind {
        ComponentType::Workload => "Workload",
        ComponentType::Phase => "Phase",
        ComponentType::Session => "Session",
        ComponentType::Task => "Task",
    };
    format!("{title}: {name}")
}

fn exc_property(message: &str) -> Properties {
    let mut delta = Properties::new();
    delta.insert("exc".to_string(), Value::String(message.to_string()));
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScopeFailure, TaskError, TrackerError};
    use crate::models::{Phase, Session, Task, TaskType};
    use crate::reporting::RecordingReporter;

    async fn context() -> (ScopeContext, Arc<RecordingReporter>) {
        let handler = PersistenceHandler::in_memory().await.unwrap();
        let reporter = Arc::new(RecordingReporter::new());
        (ScopeContext::new(handler, reporter.clone()), reporter)
    }

    #[tokio::test]
    async fn test_successful_scope_finishes() {
        let (context, reporter) = context().await;
        let scope = ExecutionScope::<Workload>::open_workload(&context, "nightly").await.unwrap();
        assert_eq!(scope.component().status(), ExecutionStatus::Running);

        let workload = scope.close(Ok(())).await.unwrap();
        assert_eq!(workload.status(), ExecutionStatus::Finished);

        let stored = context
            .handler
            .find(ComponentType::Workload, workload.uuid())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.record.status, ExecutionStatus::Finished);
        assert!(stored.record.error_msg.is_none());

        let step = reporter.step_named("Workload: nightly").unwrap();
        assert!(!step.failed);
        assert!(step.ended);
    }

    #[tokio::test]
    async fn test_failed_task_records_raw_message_and_ancestors_tagged() {
        let (context, reporter) = context().await;
        let workload = ExecutionScope::<Workload>::open_workload(&context, "w").await.unwrap();
        let phase = ExecutionScope::<Phase>::open_child(
            &context,
            workload.component(),
            "p",
            (),
            &Metadata::new(),
            &Properties::new(),
        )
        .await
        .unwrap();
        let session = ExecutionScope::<Session>::open_child(
            &context,
            phase.component(),
            "s",
            (),
            &Metadata::new(),
            &Properties::new(),
        )
        .await
        .unwrap();
        let task = ExecutionScope::<Task>::open_child(
            &context,
            session.component(),
            "t",
            TaskType::Load,
            &Metadata::new(),
            &Properties::new(),
        )
        .await
        .unwrap();

        let failure = ScopeFailure::new(task.record(), TaskError::failed("disk full"));
        let err = task.close(Err(failure.clone().into())).await.unwrap_err();
        assert_eq!(err.scope_failure(), Some(&failure));

        let err = session.close(Err(err)).await.unwrap_err();
        let err = phase.close(Err(err)).await.unwrap_err();
        let err = workload.close(Err(err)).await.unwrap_err();
        assert_eq!(err.scope_failure(), Some(&failure));

        let stored_task = context
            .handler
            .find(ComponentType::Task, failure.uuid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_task.record.status, ExecutionStatus::Error);
        assert_eq!(stored_task.record.error_msg.as_deref(), Some("disk full"));

        let sessions = context.handler.find_by_name(ComponentType::Session, "s").await.unwrap();
        assert_eq!(sessions[0].record.status, ExecutionStatus::Error);
        assert_eq!(
            sessions[0].record.error_msg.as_deref(),
            Some("task 't' failed: disk full")
        );

        let task_step = reporter.step_named("Task: t").unwrap();
        assert!(task_step.failed);
        assert_eq!(task_step.properties["exc"], "disk full");
        assert!(reporter.steps().iter().all(|s| s.failed && s.ended));
    }

    #[tokio::test]
    async fn test_open_against_unstarted_parent_fails_and_marks_step() {
        let (context, reporter) = context().await;
        let parent: Workload = context.handler.create("idle", ()).await.unwrap();

        let err = ExecutionScope::<Phase>::open_child(
            &context,
            &parent,
            "orphan",
            (),
            &Metadata::new(),
            &Properties::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ExecutionError::Tracker(TrackerError::Validation(_))));

        let step = reporter.step_named("Phase: orphan").unwrap();
        assert!(step.failed);
        assert!(step.ended);
    }

    #[tokio::test]
    async fn test_rejected_finish_marks_step_failed() {
        let (context, reporter) = context().await;
        let scope = ExecutionScope::<Workload>::open_workload(&context, "raced").await.unwrap();
        let uuid = scope.component().uuid();

        sqlx::query("UPDATE workload SET status = 'finished' WHERE uuid = ?")
            .bind(uuid.to_string())
            .execute(context.handler.pool())
            .await
            .unwrap();

        let err = scope.close(Ok(())).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Tracker(ref e) if e.is_integrity()));

        let step = reporter.step_named("Workload: raced").unwrap();
        assert!(step.failed);
        assert!(step.ended);
        assert_eq!(step.properties["exc"], err.to_string());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(step_name(ComponentType::Task, "q1"), "Task: q1");
        assert_eq!(step_name(ComponentType::Session, "s"), "Session: s");
    }
}
