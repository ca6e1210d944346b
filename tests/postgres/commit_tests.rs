//! Transition commits against a real `PostgreSQL` database.

use super::helpers::{
    CapturingStore, TestDatabase, seed_task, service_over, test_runtime, user,
};
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use signoff::{
    config::WorkflowConfig,
    workflow::{
        domain::{
            Action, FinalApproval, IdempotencyKey, ReceiptOutcome, Response, Review, Status,
            StringList,
        },
        ports::{WorkflowStore, WorkflowStoreError},
        services::{
            ReviewDecision, SubmitFinalRequest, SubmitResponseRequest, SubmitReviewRequest,
            WorkflowError,
        },
    },
};
use std::sync::Arc;

#[rstest]
fn full_pipeline_commits_every_record(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "pipeline")?;
    let service = service_over(Arc::new(database.store()?), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let task = seed_task(&service, &["alice"]).await?;
        service.start_work(task.id(), user("alice")?, None).await?;
        let response = service
            .submit_response(
                SubmitResponseRequest::new(task.id(), user("alice")?, "runs recorded")
                    .with_attachments(StringList::new(["runs.csv"])?),
            )
            .await?;
        let review = service
            .submit_review(SubmitReviewRequest::new(
                response.id(),
                user("rita")?,
                ReviewDecision::Approve,
                "",
            ))
            .await?;
        let approval = service
            .submit_final(SubmitFinalRequest::new(
                review.id(),
                user("fred")?,
                ReviewDecision::Approve,
                "",
            ))
            .await?;

        let snapshot = service.get_snapshot(task.id()).await?;
        snapshot.check_consistency()?;
        eyre::ensure!(snapshot.task().status() == Status::Closed);
        eyre::ensure!(snapshot.task().version() == 4);
        eyre::ensure!(snapshot.response().map(Response::id) == Some(response.id()));
        eyre::ensure!(snapshot.review().map(Review::id) == Some(review.id()));
        eyre::ensure!(
            snapshot.final_approval().map(FinalApproval::id) == Some(approval.id())
        );

        let history = service.queries().history(task.id()).await?;
        eyre::ensure!(history.responses.len() == 1);
        eyre::ensure!(history.reviews.len() == 1);
        eyre::ensure!(history.finals.len() == 1);
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn stale_commit_is_refused_and_writes_nothing(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "stale")?;
    let store = Arc::new(CapturingStore::new(database.store()?));
    let service = service_over(Arc::clone(&store), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let task = seed_task(&service, &["alice"]).await?;
        let response = service
            .submit_response(SubmitResponseRequest::new(
                task.id(),
                user("alice")?,
                "first pass",
            ))
            .await?;
        let Some(stale) = store.last_commit() else {
            eyre::bail!("no commit reached the store");
        };

        let again = store.inner().commit(&stale).await;

        eyre::ensure!(
            matches!(
                again,
                Err(WorkflowStoreError::VersionConflict { task_id, expected: 0 })
                    if task_id == task.id()
            ),
            "expected a version conflict, got {again:?}"
        );
        let history = service.queries().history(task.id()).await?;
        eyre::ensure!(history.task.status() == Status::Review);
        eyre::ensure!(history.task.version() == 1);
        let ids: Vec<_> = history.responses.iter().map(Response::id).collect();
        eyre::ensure!(ids == vec![response.id()]);
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn reused_key_is_refused_by_the_receipt_constraint(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "receipt_key")?;
    let store = Arc::new(CapturingStore::new(database.store()?));
    let service = service_over(
        Arc::clone(&store),
        WorkflowConfig::default().with_max_conflict_retries(0),
    );
    let rt = test_runtime()?;

    rt.block_on(async {
        let task = seed_task(&service, &["alice"]).await?;
        let key = IdempotencyKey::new("alice-1")?;
        service
            .start_work(task.id(), user("alice")?, Some(key.clone()))
            .await?;
        store.hide_receipts();

        let blind = service
            .submit_response(
                SubmitResponseRequest::new(task.id(), user("alice")?, "answer")
                    .with_idempotency_key(key),
            )
            .await;
        eyre::ensure!(
            matches!(blind, Err(WorkflowError::Busy(id)) if id == task.id()),
            "expected the refused commit to surface as busy, got {blind:?}"
        );

        let Some(refused) = store.last_commit() else {
            eyre::bail!("no commit reached the store");
        };
        eyre::ensure!(refused.expected_version() == 1);
        let direct = store.inner().commit(&refused).await;
        eyre::ensure!(
            matches!(direct, Err(WorkflowStoreError::DuplicateRecord { .. })),
            "expected a duplicate receipt, got {direct:?}"
        );

        let history = service.queries().history(task.id()).await?;
        eyre::ensure!(history.task.status() == Status::InProgress);
        eyre::ensure!(history.task.version() == 1);
        eyre::ensure!(history.responses.is_empty());
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn receipt_is_read_back_by_key(shared_test_cluster: &'static TestCluster) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "receipt_read")?;
    let store = Arc::new(database.store()?);
    let service = service_over(Arc::clone(&store), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let task = seed_task(&service, &["alice"]).await?;
        let key = IdempotencyKey::new("alice-submit")?;
        let request = SubmitResponseRequest::new(task.id(), user("alice")?, "answer")
            .with_idempotency_key(key.clone());
        let response = service.submit_response(request.clone()).await?;

        let Some(receipt) = store.find_receipt(task.id(), &key).await? else {
            eyre::bail!("receipt was not stored");
        };
        eyre::ensure!(receipt.task_id() == task.id());
        eyre::ensure!(receipt.action() == Action::SubmitResponse);
        eyre::ensure!(receipt.actor_id() == &user("alice")?);
        eyre::ensure!(
            receipt.outcome()
                == ReceiptOutcome {
                    task_status: Status::Review,
                    task_version: 1,
                    response_id: Some(response.id()),
                    review_id: None,
                    final_id: None,
                }
        );
        let unused = store
            .find_receipt(task.id(), &IdempotencyKey::new("never-sent")?)
            .await?;
        eyre::ensure!(unused.is_none());

        let replayed = service.submit_response(request).await?;
        eyre::ensure!(replayed.id() == response.id());
        eyre::ensure!(service.queries().history(task.id()).await?.responses.len() == 1);
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn separate_pools_race_on_the_task_version(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "race")?;
    let left = service_over(Arc::new(database.store()?), WorkflowConfig::default());
    let right = service_over(Arc::new(database.store()?), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let task = seed_task(&left, &["alice", "bob"]).await?;

        let (first, second) = tokio::join!(
            left.submit_response(SubmitResponseRequest::new(task.id(), user("alice")?, "a")),
            right.submit_response(SubmitResponseRequest::new(task.id(), user("bob")?, "b")),
        );

        eyre::ensure!(
            first.is_ok() != second.is_ok(),
            "exactly one submission should win: {first:?} / {second:?}"
        );
        let history = left.queries().history(task.id()).await?;
        eyre::ensure!(history.responses.len() == 1);
        eyre::ensure!(history.task.version() == 1);
        left.get_snapshot(task.id()).await?.check_consistency()?;
        Ok::<_, eyre::Report>(())
    })
}
