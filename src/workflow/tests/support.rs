//! Builders shared by workflow unit tests.

use crate::workflow::domain::{
    ActionPayload, Actor, ActorRole, ProjectId, Status, StringList, Task, TaskSnapshot, TransitionCommit,
    TransitionRequest, UserId, Verdict, decide,
};
use chrono::Utc;
use mockable::DefaultClock;

pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("valid user id")
}

pub fn pending_snapshot() -> TaskSnapshot {
    let assignees = StringList::new(["alice", "bob"]).expect("valid assignees");
    let task = Task::new(
        ProjectId::new(),
        "Prepare site survey",
        assignees,
        user("tech"),
        &DefaultClock,
    )
    .expect("valid task");
    TaskSnapshot::new(task, None, None, None)
}

pub fn request_as(snapshot: &TaskSnapshot, actor: Actor, payload: ActionPayload) -> TransitionRequest {
    TransitionRequest::new(snapshot.task().id(), actor, payload)
}

/// Builds the request a well-behaved caller would send for `payload`.
pub fn request_for(snapshot: &TaskSnapshot, payload: ActionPayload) -> TransitionRequest {
    let actor = match payload.action().required_role() {
        ActorRole::Assignee => Actor::assignee(user("alice")),
        ActorRole::Reviewer => Actor::reviewer(user("rita")),
        ActorRole::FinalApprover => Actor::final_approver(user("fred")),
        ActorRole::Technical => Actor::new(user("tech"), ActorRole::Technical),
    };
    request_as(snapshot, actor, payload)
}

pub fn submit() -> ActionPayload {
    ActionPayload::SubmitResponse {
        comments: "survey attached".to_owned(),
        attachments: StringList::new(["survey.pdf"]).expect("valid attachments"),
    }
}

pub fn approve_response() -> ActionPayload {
    ActionPayload::ApproveResponse {
        response_id: None,
        comments: String::new(),
    }
}

pub fn reject_response(comments: &str) -> ActionPayload {
    ActionPayload::RejectResponse {
        response_id: None,
        comments: comments.to_owned(),
    }
}

pub fn approve_final() -> ActionPayload {
    ActionPayload::ApproveFinal {
        review_id: None,
        comments: "ship it".to_owned(),
    }
}

pub fn reject_final(comments: &str) -> ActionPayload {
    ActionPayload::RejectFinal {
        review_id: None,
        comments: comments.to_owned(),
    }
}

/// Applies an accepted request and returns the commit it produces.
pub fn commit(snapshot: &TaskSnapshot, request: &TransitionRequest) -> TransitionCommit {
    let Ok(Verdict::Apply(plan)) = decide(snapshot, request, None) else {
        panic!("expected {} to be accepted", request.action());
    };
    TransitionCommit::prepare(snapshot, request, plan, Utc::now()).expect("plan materialises")
}

pub fn advance(snapshot: &TaskSnapshot, payload: ActionPayload) -> TaskSnapshot {
    let request = request_for(snapshot, payload);
    commit(snapshot, &request).resulting_snapshot().clone()
}

/// Drives a fresh task along the happy path until it reaches `status`.
pub fn snapshot_in(status: Status) -> TaskSnapshot {
    let pending = pending_snapshot();
    match status {
        Status::Pending => pending,
        Status::InProgress => advance(&pending, ActionPayload::StartWork),
        Status::Review => advance(&pending, submit()),
        Status::FinalReview => advance(&snapshot_in(Status::Review), approve_response()),
        Status::Closed => advance(&snapshot_in(Status::FinalReview), approve_final()),
        Status::Rejected => panic!("tasks never rest in rejected"),
    }
}
