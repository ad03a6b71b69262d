// State machine module for component lifecycles
//
// Every workload component follows the same linear lifecycle:
// NOT_YET_STARTED -> RUNNING -> {FINISHED, ERROR, TIMED_OUT, ABORTED}.

pub mod guards;
pub mod states;

pub use guards::{TransitionEvent, TransitionGuard};
pub use states::ExecutionStatus;
