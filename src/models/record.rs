//! # Component Records
//!
//! Columns shared by every level of a workload, plus the `Component` trait that
//! lets the persistence handler and execution scopes treat the four levels with
//! a single generic implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::component_type::ComponentType;
use super::task_type::TaskType;
use crate::state_machine::ExecutionStatus;

/// Common attributes of a workload, phase, session or task.
///
/// Instances are transient views; the persisted row is authoritative and the
/// handler only mutates a record after its write has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub uuid: Uuid,
    pub create_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ExecutionStatus,
    pub component_type: ComponentType,
    pub meta_data: String,
    pub error_msg: Option<String>,
}

impl ComponentRecord {
    /// Fresh, not yet started record with a new uuid
    pub fn new(name: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            name: name.into(),
            uuid: Uuid::new_v4(),
            create_time: Utc::now(),
            start_time: None,
            end_time: None,
            status: ExecutionStatus::NotYetStarted,
            component_type,
            meta_data: String::new(),
            error_msg: None,
        }
    }
}

/// A typed level of the workload hierarchy.
pub trait Component: Send + Sync {
    /// Extra data needed to construct the component beyond its name
    type Init: Send;

    const COMPONENT_TYPE: ComponentType;

    fn from_parts(record: ComponentRecord, init: Self::Init) -> Self;

    fn record(&self) -> &ComponentRecord;

    fn record_mut(&mut self) -> &mut ComponentRecord;

    fn task_type(&self) -> Option<TaskType> {
        None
    }

    fn uuid(&self) -> Uuid {
        self.record().uuid
    }

    fn name(&self) -> &str {
        &self.record().name
    }

    fn status(&self) -> ExecutionStatus {
        self.record().status
    }
}

/// A component that is started underneath a parent of a fixed kind.
pub trait ChildComponent: Component {
    type Parent: Component;
}
