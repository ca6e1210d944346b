//! Diesel schema for workflow persistence.

diesel::table! {
    /// Projects grouping tasks.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Project title.
        title -> Text,
        /// Creating user.
        created_by -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks and their active-record links.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Task title.
        title -> Text,
        /// Optional free-text description.
        description -> Nullable<Text>,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Assigned users.
        assignees -> Array<Text>,
        /// Creating user.
        created_by -> Text,
        /// Canonical workflow status.
        #[max_length = 50]
        status -> Varchar,
        /// Response currently under review.
        active_response_id -> Nullable<Uuid>,
        /// Review currently awaiting final approval.
        active_review_id -> Nullable<Uuid>,
        /// Approving final record.
        final_id -> Nullable<Uuid>,
        /// Optimistic concurrency version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last transition timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Assignee submissions.
    responses (id) {
        /// Response identifier.
        id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Project of the parent task.
        project_id -> Uuid,
        /// Submission comments.
        comments -> Text,
        /// Attachment references.
        attachments -> Array<Text>,
        /// Submitting user.
        responded_by -> Text,
        /// Submission timestamp.
        responded_at -> Timestamptz,
        /// Derived workflow status.
        #[max_length = 50]
        status -> Varchar,
    }
}

diesel::table! {
    /// Reviewer decisions on responses.
    reviews (id) {
        /// Review identifier.
        id -> Uuid,
        /// Reviewed response.
        response_id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Project of the parent task.
        project_id -> Uuid,
        /// Reviewer comments.
        comments -> Text,
        /// Reviewing user.
        reviewed_by -> Text,
        /// Decision timestamp.
        reviewed_at -> Timestamptz,
        /// Derived workflow status.
        #[max_length = 50]
        status -> Varchar,
    }
}

diesel::table! {
    /// Final-approval verdicts.
    finals (id) {
        /// Final record identifier.
        id -> Uuid,
        /// Judged review.
        review_id -> Uuid,
        /// Response under the judged review.
        response_id -> Uuid,
        /// Parent task.
        task_id -> Uuid,
        /// Project of the parent task.
        project_id -> Uuid,
        /// Approver comments.
        comments -> Text,
        /// Deciding user.
        approved_by -> Text,
        /// Verdict timestamp.
        approved_at -> Timestamptz,
        /// Verdict.
        #[max_length = 50]
        status -> Varchar,
    }
}

diesel::table! {
    /// Applied transitions keyed by caller-supplied idempotency key.
    transition_receipts (task_id, idempotency_key) {
        /// Task the transition applied to.
        task_id -> Uuid,
        /// Caller-supplied idempotency key.
        #[max_length = 255]
        idempotency_key -> Varchar,
        /// Applied action.
        #[max_length = 50]
        action -> Varchar,
        /// Acting user.
        actor_id -> Text,
        /// Payload fingerprint.
        #[max_length = 64]
        fingerprint -> Varchar,
        /// Task status after the transition.
        #[max_length = 50]
        task_status -> Varchar,
        /// Task version after the transition.
        task_version -> Int8,
        /// Response written by the transition.
        response_id -> Nullable<Uuid>,
        /// Review written by the transition.
        review_id -> Nullable<Uuid>,
        /// Final record written by the transition.
        final_id -> Nullable<Uuid>,
        /// Application timestamp.
        applied_at -> Timestamptz,
    }
}
