use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::component_type::ComponentType;
use super::record::ComponentRecord;
use super::task_type::TaskType;

/// Per-edge metadata attached when a child starts underneath its parent
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A persisted parent -> child execution edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub parent_type: ComponentType,
    pub parent_uuid: Uuid,
    pub child_type: ComponentType,
    pub child_uuid: Uuid,
    pub metadata: Metadata,
}

/// An entity row read back from the store without a static kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredComponent {
    #[serde(flatten)]
    pub record: ComponentRecord,
    pub task_type: Option<TaskType>,
}
