use serde::{Deserialize, Serialize};

use super::component_type::ComponentType;
use super::record::{ChildComponent, Component, ComponentRecord};
use super::task_type::TaskType;

/// A workload is a sequence of phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    #[serde(flatten)]
    pub record: ComponentRecord,
}

/// A phase is a collection of sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(flatten)]
    pub record: ComponentRecord,
}

/// A session is a sequence of tasks that represents a logical unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(flatten)]
    pub record: ComponentRecord,
}

/// Smallest dispatched unit of a workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    pub record: ComponentRecord,
    pub task_type: TaskType,
}

macro_rules! plain_component {
    ($ty:ident, $kind:expr) => {
        impl Component for $ty {
            type Init = ();

            const COMPONENT_TYPE: ComponentType = $kind;

            fn from_parts(record: ComponentRecord, _init: ()) -> Self {
                Self { record }
            }

            fn record(&self) -> &ComponentRecord {
                &self.record
            }

            fn record_mut(&mut self) -> &mut ComponentRecord {
                &mut self.record
            }
        }
    };
}

plain_component!(Workload, ComponentType::Workload);
plain_component!(Phase, ComponentType::Phase);
plain_component!(Session, ComponentType::Session);

impl Component for Task {
    type Init = TaskType;

    const COMPONENT_TYPE: ComponentType = ComponentType::Task;

    fn from_parts(record: ComponentRecord, task_type: TaskType) -> Self {
        Self { record, task_type }
    }

    fn record(&self) -> &ComponentRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut ComponentRecord {
        &mut self.record
    }

    fn task_type(&self) -> Option<TaskType> {
        Some(self.task_type)
    }
}

impl ChildComponent for Phase {
    type Parent = Workload;
}

impl ChildComponent for Session {
    type Parent = Phase;
}

impl ChildComponent for Task {
    type Parent = Session;
}
