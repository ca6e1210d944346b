//! Domain model for the approval pipeline.
//!
//! Holds the records of one task's chain (task, responses, reviews, final
//! approvals), the shared status vocabulary and the pure state machine that
//! decides which transitions are legal. Nothing in this module performs I/O.

mod action;
mod commit;
mod error;
mod event;
mod final_approval;
mod ids;
mod list;
mod machine;
mod project;
mod receipt;
mod response;
mod review;
mod snapshot;
mod status;
mod task;

pub use action::{Action, ActionPayload, Actor, ActorRole, TransitionRequest};
pub use commit::{RecordWrite, TransitionCommit};
pub use error::{ParseActionError, ParseStatusError, TransitionRejection, WorkflowDomainError};
pub use event::TransitionEvent;
pub use final_approval::{FinalApproval, PersistedFinalData};
pub use ids::{FinalId, IdempotencyKey, ProjectId, ResponseId, ReviewId, TaskId, UserId};
pub use list::StringList;
pub use machine::{RecordChange, TransitionPlan, Verdict, decide};
pub use project::Project;
pub use receipt::{PersistedReceiptData, ReceiptOutcome, TransitionReceipt};
pub use response::{PersistedResponseData, Response};
pub use review::{PersistedReviewData, Review};
pub use snapshot::{TaskHistory, TaskSnapshot};
pub use status::{FinalStatus, Status};
pub use task::{PersistedTaskData, Task, TaskLinks};
