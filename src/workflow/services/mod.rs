//! Application services for the approval pipeline.

mod coordinator;
mod error;
mod locks;
mod queries;
mod workflow;

pub use coordinator::{TransitionCoordinator, TransitionOutcome};
pub use error::{ParentRef, WorkflowError, WorkflowResult};
pub use locks::{TaskLockGuard, TaskLocks};
pub use queries::{QueryViews, StatusQuery, WorkflowRecord};
pub use workflow::{
    CreateProjectRequest, CreateTaskRequest, ReviewDecision, SubmitFinalRequest,
    SubmitResponseRequest, SubmitReviewRequest, WorkflowService,
};
