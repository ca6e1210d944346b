//! Mapping between workflow domain records and `PostgreSQL` rows.

use super::models::{FinalRow, ProjectRow, ReceiptRow, ResponseRow, ReviewRow, TaskRow};
use crate::workflow::{
    domain::{
        Action, FinalApproval, FinalId, FinalStatus, IdempotencyKey, PersistedFinalData,
        PersistedReceiptData, PersistedResponseData, PersistedReviewData, PersistedTaskData,
        Project, ProjectId, ReceiptOutcome, Response, ResponseId, Review, ReviewId, Status,
        StringList, Task, TaskId, TaskLinks, TransitionReceipt, UserId,
    },
    ports::{WorkflowStoreError, WorkflowStoreResult},
};

pub(super) fn version_to_column(version: u64) -> WorkflowStoreResult<i64> {
    i64::try_from(version).map_err(WorkflowStoreError::persistence)
}

fn version_from_column(version: i64) -> WorkflowStoreResult<u64> {
    u64::try_from(version).map_err(WorkflowStoreError::persistence)
}

fn user_from_column(value: String) -> WorkflowStoreResult<UserId> {
    UserId::new(value).map_err(WorkflowStoreError::persistence)
}

fn status_from_column(value: &str) -> WorkflowStoreResult<Status> {
    Status::try_from(value).map_err(WorkflowStoreError::persistence)
}

pub(super) fn project_to_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id().into_inner(),
        title: project.title().to_owned(),
        created_by: project.created_by().as_str().to_owned(),
        created_at: project.created_at(),
    }
}

pub(super) fn row_to_project(row: ProjectRow) -> WorkflowStoreResult<Project> {
    Ok(Project::from_persisted(
        ProjectId::from_uuid(row.id),
        row.title,
        user_from_column(row.created_by)?,
        row.created_at,
    ))
}

pub(super) fn task_to_row(task: &Task) -> WorkflowStoreResult<TaskRow> {
    let links = task.links();
    Ok(TaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        due_date: task.due_date(),
        assignees: task.assignees().as_slice().to_vec(),
        created_by: task.created_by().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        active_response_id: links.active_response_id.map(ResponseId::into_inner),
        active_review_id: links.active_review_id.map(ReviewId::into_inner),
        final_id: links.final_id.map(FinalId::into_inner),
        version: version_to_column(task.version())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

pub(super) fn row_to_task(row: TaskRow) -> WorkflowStoreResult<Task> {
    let TaskRow {
        id,
        project_id,
        title,
        description,
        due_date,
        assignees: persisted_assignees,
        created_by,
        status: persisted_status,
        active_response_id,
        active_review_id,
        final_id,
        version,
        created_at,
        updated_at,
    } = row;

    let assignees = StringList::new(persisted_assignees).map_err(WorkflowStoreError::persistence)?;
    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        project_id: ProjectId::from_uuid(project_id),
        title,
        description,
        due_date,
        assignees,
        created_by: user_from_column(created_by)?,
        status: status_from_column(&persisted_status)?,
        links: TaskLinks {
            active_response_id: active_response_id.map(ResponseId::from_uuid),
            active_review_id: active_review_id.map(ReviewId::from_uuid),
            final_id: final_id.map(FinalId::from_uuid),
        },
        version: version_from_column(version)?,
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}

pub(super) fn response_to_row(response: &Response) -> ResponseRow {
    ResponseRow {
        id: response.id().into_inner(),
        task_id: response.task_id().into_inner(),
        project_id: response.project_id().into_inner(),
        comments: response.comments().to_owned(),
        attachments: response.attachments().as_slice().to_vec(),
        responded_by: response.responded_by().as_str().to_owned(),
        responded_at: response.responded_at(),
        status: response.status().as_str().to_owned(),
    }
}

pub(super) fn row_to_response(row: ResponseRow) -> WorkflowStoreResult<Response> {
    let attachments = StringList::new(row.attachments).map_err(WorkflowStoreError::persistence)?;
    Ok(Response::from_persisted(PersistedResponseData {
        id: ResponseId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        project_id: ProjectId::from_uuid(row.project_id),
        comments: row.comments,
        attachments,
        responded_by: user_from_column(row.responded_by)?,
        responded_at: row.responded_at,
        status: status_from_column(&row.status)?,
    }))
}

pub(super) fn review_to_row(review: &Review) -> ReviewRow {
    ReviewRow {
        id: review.id().into_inner(),
        response_id: review.response_id().into_inner(),
        task_id: review.task_id().into_inner(),
        project_id: review.project_id().into_inner(),
        comments: review.comments().to_owned(),
        reviewed_by: review.reviewed_by().as_str().to_owned(),
        reviewed_at: review.reviewed_at(),
        status: review.status().as_str().to_owned(),
    }
}

pub(super) fn row_to_review(row: ReviewRow) -> WorkflowStoreResult<Review> {
    Ok(Review::from_persisted(PersistedReviewData {
        id: ReviewId::from_uuid(row.id),
        response_id: ResponseId::from_uuid(row.response_id),
        task_id: TaskId::from_uuid(row.task_id),
        project_id: ProjectId::from_uuid(row.project_id),
        comments: row.comments,
        reviewed_by: user_from_column(row.reviewed_by)?,
        reviewed_at: row.reviewed_at,
        status: status_from_column(&row.status)?,
    }))
}

pub(super) fn final_to_row(final_approval: &FinalApproval) -> FinalRow {
    FinalRow {
        id: final_approval.id().into_inner(),
        review_id: final_approval.review_id().into_inner(),
        response_id: final_approval.response_id().into_inner(),
        task_id: final_approval.task_id().into_inner(),
        project_id: final_approval.project_id().into_inner(),
        comments: final_approval.comments().to_owned(),
        approved_by: final_approval.approved_by().as_str().to_owned(),
        approved_at: final_approval.approved_at(),
        status: final_approval.status().as_str().to_owned(),
    }
}

pub(super) fn row_to_final(row: FinalRow) -> WorkflowStoreResult<FinalApproval> {
    let status = FinalStatus::try_from(row.status.as_str()).map_err(WorkflowStoreError::persistence)?;
    Ok(FinalApproval::from_persisted(PersistedFinalData {
        id: FinalId::from_uuid(row.id),
        review_id: ReviewId::from_uuid(row.review_id),
        response_id: ResponseId::from_uuid(row.response_id),
        task_id: TaskId::from_uuid(row.task_id),
        project_id: ProjectId::from_uuid(row.project_id),
        comments: row.comments,
        approved_by: user_from_column(row.approved_by)?,
        approved_at: row.approved_at,
        status,
    }))
}

pub(super) fn receipt_to_row(receipt: &TransitionReceipt) -> WorkflowStoreResult<ReceiptRow> {
    let outcome = receipt.outcome();
    Ok(ReceiptRow {
        task_id: receipt.task_id().into_inner(),
        idempotency_key: receipt.idempotency_key().as_str().to_owned(),
        action: receipt.action().as_str().to_owned(),
        actor_id: receipt.actor_id().as_str().to_owned(),
        fingerprint: receipt.fingerprint().to_owned(),
        task_status: outcome.task_status.as_str().to_owned(),
        task_version: version_to_column(outcome.task_version)?,
        response_id: outcome.response_id.map(ResponseId::into_inner),
        review_id: outcome.review_id.map(ReviewId::into_inner),
        final_id: outcome.final_id.map(FinalId::into_inner),
        applied_at: receipt.applied_at(),
    })
}

pub(super) fn row_to_receipt(row: ReceiptRow) -> WorkflowStoreResult<TransitionReceipt> {
    let action = Action::try_from(row.action.as_str()).map_err(WorkflowStoreError::persistence)?;
    let idempotency_key =
        IdempotencyKey::new(row.idempotency_key).map_err(WorkflowStoreError::persistence)?;
    Ok(TransitionReceipt::from_persisted(PersistedReceiptData {
        task_id: TaskId::from_uuid(row.task_id),
        idempotency_key,
        action,
        actor_id: user_from_column(row.actor_id)?,
        fingerprint: row.fingerprint,
        outcome: ReceiptOutcome {
            task_status: status_from_column(&row.task_status)?,
            task_version: version_from_column(row.task_version)?,
            response_id: row.response_id.map(ResponseId::from_uuid),
            review_id: row.review_id.map(ReviewId::from_uuid),
            final_id: row.final_id.map(FinalId::from_uuid),
        },
        applied_at: row.applied_at,
    }))
}
