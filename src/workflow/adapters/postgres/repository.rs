//! `PostgreSQL` store implementation for workflow records.

use super::{
    conversions::{
        final_to_row, project_to_row, receipt_to_row, response_to_row, review_to_row,
        row_to_final, row_to_project, row_to_receipt, row_to_response, row_to_review, row_to_task,
        task_to_row, version_to_column,
    },
    models::{FinalRow, ProjectRow, ReceiptRow, ResponseRow, ReviewRow, TaskRow},
    schema::{finals, projects, responses, reviews, tasks, transition_receipts},
};
use crate::workflow::{
    domain::{
        FinalApproval, FinalId, FinalStatus, IdempotencyKey, Project, ProjectId, RecordWrite,
        Response, ResponseId, Review, ReviewId, Status, Task, TaskId, TaskSnapshot,
        TransitionCommit, TransitionReceipt, UserId,
    },
    ports::{WorkflowStore, WorkflowStoreError, WorkflowStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by the workflow store.
pub type WorkflowPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed workflow store.
///
/// Commits run in one transaction guarded by a conditional update on the
/// task version, so two writers that read the same snapshot cannot both
/// apply.
#[derive(Debug, Clone)]
pub struct PostgresWorkflowStore {
    pool: WorkflowPgPool,
}

impl PostgresWorkflowStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkflowPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkflowStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkflowStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkflowStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkflowStoreError::persistence)?
    }
}

impl From<DieselError> for WorkflowStoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                let key = info
                    .constraint_name()
                    .unwrap_or_else(|| info.message());
                Self::duplicate("record", key)
            }
            other => Self::persistence(other),
        }
    }
}

fn load_task(connection: &mut PgConnection, id: TaskId) -> WorkflowStoreResult<Option<Task>> {
    let row = tasks::table
        .find(id.into_inner())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()?;
    row.map(row_to_task).transpose()
}

fn load_response(
    connection: &mut PgConnection,
    id: ResponseId,
) -> WorkflowStoreResult<Option<Response>> {
    let row = responses::table
        .find(id.into_inner())
        .select(ResponseRow::as_select())
        .first::<ResponseRow>(connection)
        .optional()?;
    row.map(row_to_response).transpose()
}

fn load_review(connection: &mut PgConnection, id: ReviewId) -> WorkflowStoreResult<Option<Review>> {
    let row = reviews::table
        .find(id.into_inner())
        .select(ReviewRow::as_select())
        .first::<ReviewRow>(connection)
        .optional()?;
    row.map(row_to_review).transpose()
}

fn load_final(
    connection: &mut PgConnection,
    id: FinalId,
) -> WorkflowStoreResult<Option<FinalApproval>> {
    let row = finals::table
        .find(id.into_inner())
        .select(FinalRow::as_select())
        .first::<FinalRow>(connection)
        .optional()?;
    row.map(row_to_final).transpose()
}

fn load_snapshot_rows(
    connection: &mut PgConnection,
    task_id: TaskId,
) -> WorkflowStoreResult<Option<TaskSnapshot>> {
    let Some(task) = load_task(connection, task_id)? else {
        return Ok(None);
    };
    let links = task.links();
    let response = match links.active_response_id {
        Some(id) => load_response(connection, id)?,
        None => None,
    };
    let review = match links.active_review_id {
        Some(id) => load_review(connection, id)?,
        None => None,
    };
    let final_approval = match links.final_id {
        Some(id) => load_final(connection, id)?,
        None => None,
    };
    Ok(Some(TaskSnapshot::new(task, response, review, final_approval)))
}

fn apply_commit(connection: &mut PgConnection, commit: &TransitionCommit) -> WorkflowStoreResult<()> {
    let task = commit.task();
    let links = task.links();
    let updated = diesel::update(
        tasks::table
            .filter(tasks::id.eq(task.id().into_inner()))
            .filter(tasks::version.eq(version_to_column(commit.expected_version())?)),
    )
    .set((
        tasks::status.eq(task.status().as_str()),
        tasks::active_response_id.eq(links.active_response_id.map(ResponseId::into_inner)),
        tasks::active_review_id.eq(links.active_review_id.map(ReviewId::into_inner)),
        tasks::final_id.eq(links.final_id.map(FinalId::into_inner)),
        tasks::version.eq(version_to_column(task.version())?),
        tasks::updated_at.eq(task.updated_at()),
    ))
    .execute(connection)?;
    if updated == 0 {
        return Err(WorkflowStoreError::VersionConflict {
            task_id: task.id(),
            expected: commit.expected_version(),
        });
    }

    match commit.response() {
        Some(RecordWrite::Insert(response)) => {
            diesel::insert_into(responses::table)
                .values(&response_to_row(response))
                .execute(connection)?;
        }
        Some(RecordWrite::Update(response)) => {
            let changed = diesel::update(responses::table.find(response.id().into_inner()))
                .set(responses::status.eq(response.status().as_str()))
                .execute(connection)?;
            if changed == 0 {
                return Err(WorkflowStoreError::not_found("response", response.id()));
            }
        }
        None => {}
    }

    match commit.review() {
        Some(RecordWrite::Insert(review)) => {
            diesel::insert_into(reviews::table)
                .values(&review_to_row(review))
                .execute(connection)?;
        }
        Some(RecordWrite::Update(review)) => {
            let changed = diesel::update(reviews::table.find(review.id().into_inner()))
                .set(reviews::status.eq(review.status().as_str()))
                .execute(connection)?;
            if changed == 0 {
                return Err(WorkflowStoreError::not_found("review", review.id()));
            }
        }
        None => {}
    }

    if let Some(final_approval) = commit.final_approval() {
        diesel::insert_into(finals::table)
            .values(&final_to_row(final_approval))
            .execute(connection)?;
    }

    diesel::insert_into(transition_receipts::table)
        .values(&receipt_to_row(commit.receipt())?)
        .execute(connection)?;
    Ok(())
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn store_project(&self, project: &Project) -> WorkflowStoreResult<()> {
        let row = project_to_row(project);
        self.run_blocking(move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn find_project(&self, id: ProjectId) -> WorkflowStoreResult<Option<Project>> {
        self.run_blocking(move |connection| {
            let row = projects::table
                .find(id.into_inner())
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()?;
            row.map(row_to_project).transpose()
        })
        .await
    }

    async fn insert_task(&self, task: &Task) -> WorkflowStoreResult<()> {
        let row = task_to_row(task)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn find_task(&self, id: TaskId) -> WorkflowStoreResult<Option<Task>> {
        self.run_blocking(move |connection| load_task(connection, id))
            .await
    }

    async fn find_response(&self, id: ResponseId) -> WorkflowStoreResult<Option<Response>> {
        self.run_blocking(move |connection| load_response(connection, id))
            .await
    }

    async fn find_review(&self, id: ReviewId) -> WorkflowStoreResult<Option<Review>> {
        self.run_blocking(move |connection| load_review(connection, id))
            .await
    }

    async fn find_final(&self, id: FinalId) -> WorkflowStoreResult<Option<FinalApproval>> {
        self.run_blocking(move |connection| load_final(connection, id))
            .await
    }

    async fn load_snapshot(&self, task_id: TaskId) -> WorkflowStoreResult<Option<TaskSnapshot>> {
        self.run_blocking(move |connection| {
            connection
                .build_transaction()
                .repeatable_read()
                .read_only()
                .run(|tx| load_snapshot_rows(tx, task_id))
        })
        .await
    }

    async fn find_receipt(
        &self,
        task_id: TaskId,
        key: &IdempotencyKey,
    ) -> WorkflowStoreResult<Option<TransitionReceipt>> {
        let lookup_key = key.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = transition_receipts::table
                .find((task_id.into_inner(), lookup_key))
                .select(ReceiptRow::as_select())
                .first::<ReceiptRow>(connection)
                .optional()?;
            row.map(row_to_receipt).transpose()
        })
        .await
    }

    async fn commit(&self, commit: &TransitionCommit) -> WorkflowStoreResult<()> {
        let owned = commit.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkflowStoreError, _>(|tx| apply_commit(tx, &owned))
        })
        .await
    }

    async fn tasks_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::status.eq(status.as_str()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn responses_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Response>> {
        self.run_blocking(move |connection| {
            responses::table
                .filter(responses::status.eq(status.as_str()))
                .order((responses::responded_at.asc(), responses::id.asc()))
                .select(ResponseRow::as_select())
                .load::<ResponseRow>(connection)?
                .into_iter()
                .map(row_to_response)
                .collect()
        })
        .await
    }

    async fn reviews_with_status(&self, status: Status) -> WorkflowStoreResult<Vec<Review>> {
        self.run_blocking(move |connection| {
            reviews::table
                .filter(reviews::status.eq(status.as_str()))
                .order((reviews::reviewed_at.asc(), reviews::id.asc()))
                .select(ReviewRow::as_select())
                .load::<ReviewRow>(connection)?
                .into_iter()
                .map(row_to_review)
                .collect()
        })
        .await
    }

    async fn finals_with_status(
        &self,
        status: FinalStatus,
    ) -> WorkflowStoreResult<Vec<FinalApproval>> {
        self.run_blocking(move |connection| {
            finals::table
                .filter(finals::status.eq(status.as_str()))
                .order((finals::approved_at.asc(), finals::id.asc()))
                .select(FinalRow::as_select())
                .load::<FinalRow>(connection)?
                .into_iter()
                .map(row_to_final)
                .collect()
        })
        .await
    }

    async fn tasks_for_project(&self, project_id: ProjectId) -> WorkflowStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn tasks_for_assignee(&self, user: &UserId) -> WorkflowStoreResult<Vec<Task>> {
        let member = vec![user.as_str().to_owned()];
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::assignees.contains(member))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn responses_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Response>> {
        self.run_blocking(move |connection| {
            responses::table
                .filter(responses::task_id.eq(task_id.into_inner()))
                .order((responses::responded_at.asc(), responses::id.asc()))
                .select(ResponseRow::as_select())
                .load::<ResponseRow>(connection)?
                .into_iter()
                .map(row_to_response)
                .collect()
        })
        .await
    }

    async fn reviews_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<Review>> {
        self.run_blocking(move |connection| {
            reviews::table
                .filter(reviews::task_id.eq(task_id.into_inner()))
                .order((reviews::reviewed_at.asc(), reviews::id.asc()))
                .select(ReviewRow::as_select())
                .load::<ReviewRow>(connection)?
                .into_iter()
                .map(row_to_review)
                .collect()
        })
        .await
    }

    async fn finals_for_task(&self, task_id: TaskId) -> WorkflowStoreResult<Vec<FinalApproval>> {
        self.run_blocking(move |connection| {
            finals::table
                .filter(finals::task_id.eq(task_id.into_inner()))
                .order((finals::approved_at.asc(), finals::id.asc()))
                .select(FinalRow::as_select())
                .load::<FinalRow>(connection)?
                .into_iter()
                .map(row_to_final)
                .collect()
        })
        .await
    }
}
