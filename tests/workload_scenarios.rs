//! End-to-end runs of workload definitions against an in-memory store.

mod common;

use common::*;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use workload_tracker::error::{ExecutionError, TaskError};
use workload_tracker::execution::{PhaseDefinition, SessionDefinition, WorkloadDefinition};
use workload_tracker::models::{Component, ComponentType, StoredComponent};
use workload_tracker::persistence::PersistenceHandler;
use workload_tracker::state_machine::ExecutionStatus;

async fn single(handler: &PersistenceHandler, kind: ComponentType, name: &str) -> StoredComponent {
    let mut found = handler.find_by_name(kind, name).await.unwrap();
    assert_eq!(found.len(), 1, "expected exactly one {kind} named {name}");
    found.remove(0)
}

fn assert_lifecycle_consistent(component: &StoredComponent) {
    let record = &component.record;
    match record.status {
        ExecutionStatus::NotYetStarted => {
            assert!(record.start_time.is_none() && record.end_time.is_none());
        }
        ExecutionStatus::Running => {
            assert!(record.start_time.is_some() && record.end_time.is_none());
        }
        _ => {
            assert!(record.status.is_terminal());
            assert!(record.start_time.is_some() && record.end_time.is_some());
        }
    }
}

#[tokio::test]
async fn test_second_task_failure_ends_every_ancestor_as_error() {
    let (runner, reporter) = test_runner().await;
    let definition = WorkloadDefinition::new("w").phase(
        PhaseDefinition::new("p").session(
            SessionDefinition::new("s")
                .task(ok_task("t1"))
                .task(failing_task("t2", "connection reset")),
        ),
    );

    let err = runner.run(definition).await.unwrap_err();
    let failure = err.scope_failure().expect("task failure");
    assert_eq!(failure.component_type, ComponentType::Task);
    assert_eq!(failure.name, "t2");
    assert_eq!(failure.cause, TaskError::failed("connection reset"));

    let handler = runner.handler();
    let t1 = single(handler, ComponentType::Task, "t1").await;
    let t2 = single(handler, ComponentType::Task, "t2").await;
    let session = single(handler, ComponentType::Session, "s").await;
    let phase = single(handler, ComponentType::Phase, "p").await;
    let workload = single(handler, ComponentType::Workload, "w").await;

    assert_eq!(t1.record.status, ExecutionStatus::Finished);
    assert_eq!(t2.record.status, ExecutionStatus::Error);
    assert_eq!(session.record.status, ExecutionStatus::Error);
    assert_eq!(phase.record.status, ExecutionStatus::Error);
    assert_eq!(workload.record.status, ExecutionStatus::Error);

    assert!(t1.record.error_msg.is_none());
    assert_eq!(t2.record.error_msg.as_deref(), Some("connection reset"));
    let tagged = "task 't2' failed: connection reset";
    assert_eq!(session.record.error_msg.as_deref(), Some(tagged));
    assert_eq!(phase.record.error_msg.as_deref(), Some(tagged));
    assert_eq!(workload.record.error_msg.as_deref(), Some(tagged));

    assert!(t1.record.end_time.unwrap() < t2.record.start_time.unwrap());
    for component in [&t1, &t2, &session, &phase, &workload] {
        assert_lifecycle_consistent(component);
    }

    let steps = reporter.steps();
    let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Workload: w", "Phase: p", "Session: s", "Task: t1", "Task: t2"]
    );
    assert!(steps.iter().all(|s| s.ended));
    assert!(!reporter.step_named("Task: t1").unwrap().failed);
    assert_eq!(
        reporter.step_named("Session: s").unwrap().properties["exc"],
        tagged
    );
}

#[tokio::test]
async fn test_failed_phase_prevents_later_phase_from_existing() {
    let (runner, _) = test_runner().await;
    let definition = WorkloadDefinition::new("two-phase")
        .phase(
            PhaseDefinition::new("warmup")
                .session(SessionDefinition::new("s0").task(failing_task("boom", "oom"))),
        )
        .phase(
            PhaseDefinition::new("measure")
                .session(SessionDefinition::new("s1").task(ok_task("never"))),
        );

    runner.run(definition).await.unwrap_err();

    let handler = runner.handler();
    assert!(handler
        .find_by_name(ComponentType::Phase, "measure")
        .await
        .unwrap()
        .is_empty());
    assert!(handler
        .find_by_name(ComponentType::Task, "never")
        .await
        .unwrap()
        .is_empty());

    let workload = single(handler, ComponentType::Workload, "two-phase").await;
    let edges = handler.children_of(&workload.record).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].metadata["phase_index"], 0);
}

#[tokio::test]
async fn test_every_started_child_has_exactly_one_edge() {
    let (runner, _) = test_runner().await;
    let definition = WorkloadDefinition::new("edges")
        .phase(
            PhaseDefinition::new("p0")
                .session(
                    SessionDefinition::new("s0")
                        .task(ok_task("a"))
                        .task(ok_task("b")),
                )
                .session(SessionDefinition::new("s1").task(ok_task("c"))),
        )
        .phase(
            PhaseDefinition::new("p1").session(SessionDefinition::new("s2").task(ok_task("d"))),
        );

    let workload = runner.run(definition).await.unwrap();
    assert_eq!(workload.status(), ExecutionStatus::Finished);

    let handler = runner.handler();
    for kind in [ComponentType::Phase, ComponentType::Session, ComponentType::Task] {
        for component in handler.list(kind).await.unwrap() {
            assert_lifecycle_consistent(&component);
            let edge = handler
                .association_for(kind, component.record.uuid)
                .await
                .unwrap();
            assert_eq!(
                edge.is_some(),
                component.record.status.has_started(),
                "{kind} {}",
                component.record.name
            );
        }
    }

    let s0 = single(handler, ComponentType::Session, "s0").await;
    let task_edges = handler.children_of(&s0.record).await.unwrap();
    assert_eq!(task_edges.len(), 2);
    assert_eq!(task_edges[1].metadata["task_index"], 1);
    assert_eq!(task_edges[1].metadata["session_index"], 0);

    let d = single(handler, ComponentType::Task, "d").await;
    let edge = handler
        .association_for(ComponentType::Task, d.record.uuid)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edge.metadata["phase_index"], 1);
    assert_eq!(edge.metadata["session_index"], 0);
}

#[tokio::test]
async fn test_wait_timeout_ends_task_as_error() {
    let (runner, _) = runner_with(hosts(&[]), Duration::from_millis(20)).await;
    let definition = WorkloadDefinition::new("stalled").phase(
        PhaseDefinition::new("p").session(
            SessionDefinition::new("s")
                .task(slow_task("stuck", Duration::from_secs(30)))
                .task(ok_task("after")),
        ),
    );

    let err = runner.run(definition).await.unwrap_err();
    assert!(matches!(
        err.scope_failure().map(|f| &f.cause),
        Some(TaskError::TimedOut(_))
    ));

    let handler = runner.handler();
    let stuck = single(handler, ComponentType::Task, "stuck").await;
    assert_eq!(stuck.record.status, ExecutionStatus::Error);
    assert!(handler
        .find_by_name(ComponentType::Task, "after")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_tasks_are_dispatched_across_configured_hosts() {
    let pool = hosts(&["client-a", "client-b", "client-c"]);
    let (runner, _) = runner_with(pool, Duration::ZERO).await;
    let trace: HostTrace = Arc::new(Mutex::new(Vec::new()));

    let mut session = SessionDefinition::new("spray");
    for i in 0..60 {
        session = session.task(host_recording_task(&format!("t{i}"), &trace));
    }
    let definition = WorkloadDefinition::new("hosts").phase(PhaseDefinition::new("p").session(session));

    runner.run(definition).await.unwrap();

    let seen = trace.lock();
    assert_eq!(seen.len(), 60);
    let distinct: HashSet<_> = seen.iter().flatten().cloned().collect();
    assert!(distinct.len() >= 2, "all tasks went to {distinct:?}");
    assert!(distinct
        .iter()
        .all(|h| ["client-a", "client-b", "client-c"].contains(&h.as_str())));
}

#[tokio::test]
async fn test_empty_host_pool_dispatches_without_host() {
    let (runner, _) = test_runner().await;
    let trace: HostTrace = Arc::new(Mutex::new(Vec::new()));
    let definition = WorkloadDefinition::new("local").phase(
        PhaseDefinition::new("p")
            .session(SessionDefinition::new("s").task(host_recording_task("t", &trace))),
    );

    runner.run(definition).await.unwrap();
    assert_eq!(*trace.lock(), vec![None]);
}

#[tokio::test]
async fn test_default_task_names_and_task_type_column() {
    let (runner, reporter) = test_runner().await;
    let job = workload_tracker::execution::SpawnedJob::new(
        "q6",
        |_host: Option<workload_tracker::config::HostConfig>| async { Ok(()) },
    );
    let definition = WorkloadDefinition::new(unique_name("named")).phase(
        PhaseDefinition::new("p").session(
            SessionDefinition::new("s")
                .task(workload_tracker::execution::BenchmarkTask::SingleUser(job)),
        ),
    );

    runner.run(definition).await.unwrap();

    let task = single(runner.handler(), ComponentType::Task, "single_user_q6").await;
    assert_eq!(task.task_type, Some(workload_tracker::models::TaskType::SingleUser));
    let step = reporter.step_named("Task: single_user_q6").unwrap();
    assert_eq!(step.properties["task_type"], "single_user");
}

#[tokio::test]
async fn test_store_failure_surfaces_as_tracker_error() {
    let (runner, _) = test_runner().await;
    sqlx::query("DROP TABLE session_tasks")
        .execute(runner.handler().pool())
        .await
        .unwrap();
    sqlx::query("DROP TABLE base_task")
        .execute(runner.handler().pool())
        .await
        .unwrap();

    let definition = WorkloadDefinition::new("broken-store").phase(
        PhaseDefinition::new("p").session(SessionDefinition::new("s").task(ok_task("t"))),
    );

    // ensure_schema does not recreate tables once migrations are recorded
    let err = runner.run(definition).await.unwrap_err();
    assert!(matches!(err, ExecutionError::Tracker(_)));

    let session = single(runner.handler(), ComponentType::Session, "s").await;
    assert_eq!(session.record.status, ExecutionStatus::Error);
    assert!(session.record.error_msg.is_some());
}

#[tokio::test]
async fn test_rejected_task_edge_leaves_unstarted_orphan() {
    let (runner, reporter) = test_runner().await;
    sqlx::query(
        "CREATE TRIGGER reject_task_edges BEFORE INSERT ON session_tasks \
         BEGIN SELECT RAISE(ABORT, 'task edge rejected'); END",
    )
    .execute(runner.handler().pool())
    .await
    .unwrap();

    let definition = WorkloadDefinition::new("edge-rejected").phase(
        PhaseDefinition::new("p").session(SessionDefinition::new("s").task(ok_task("orphan"))),
    );

    let err = runner.run(definition).await.unwrap_err();
    assert!(matches!(err, ExecutionError::Tracker(_)));

    let handler = runner.handler();
    let orphan = single(handler, ComponentType::Task, "orphan").await;
    assert_eq!(orphan.record.status, ExecutionStatus::NotYetStarted);
    assert!(orphan.record.start_time.is_none());
    assert_lifecycle_consistent(&orphan);
    assert!(handler
        .association_for(ComponentType::Task, orphan.record.uuid)
        .await
        .unwrap()
        .is_none());

    for (kind, name) in [
        (ComponentType::Session, "s"),
        (ComponentType::Phase, "p"),
        (ComponentType::Workload, "edge-rejected"),
    ] {
        let component = single(handler, kind, name).await;
        assert_eq!(component.record.status, ExecutionStatus::Error);
        assert_lifecycle_consistent(&component);
        if kind != ComponentType::Workload {
            let edge = handler
                .association_for(kind, component.record.uuid)
                .await
                .unwrap();
            assert!(edge.is_some(), "{kind} {name} lost its edge");
        }
    }

    let step = reporter.step_named("Task: orphan").unwrap();
    assert!(step.failed);
    assert!(step.ended);
}
