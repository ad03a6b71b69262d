pub mod association;
pub mod component_type;
pub mod components;
pub mod record;
pub mod task_type;

// Re-export core models for easy access
pub use association::{AssociationRecord, Metadata, StoredComponent};
pub use component_type::{AssociationTable, ComponentType};
pub use components::{Phase, Session, Task, Workload};
pub use record::{ChildComponent, Component, ComponentRecord};
pub use task_type::TaskType;
