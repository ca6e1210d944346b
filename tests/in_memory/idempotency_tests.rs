//! In-memory integration tests for retried and replayed requests.

use super::helpers::{Fault, FaultyStore, MemoryService, faulty_service, seed_task, service, user};
use signoff::{
    config::WorkflowConfig,
    workflow::{
        domain::{
            Action, ActionPayload, Actor, ActorRole, IdempotencyKey, Status, TransitionRequest,
        },
        services::{ReviewDecision, SubmitResponseRequest, SubmitReviewRequest, WorkflowError},
    },
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retry_after_lost_acknowledgement_replays() -> Result<(), eyre::Report> {
    let store = Arc::new(FaultyStore::new(Fault::LoseFirstCommitAck));
    let service = faulty_service(&store, WorkflowConfig::default());
    let task = seed_task(&service, &["alice"]).await?;
    let request = SubmitResponseRequest::new(task.id(), user("alice"), "survey attached")
        .with_idempotency_key(IdempotencyKey::new("alice-submit-1")?);

    let lost = service.submit_response(request.clone()).await;
    eyre::ensure!(
        matches!(&lost, Err(err) if err.is_retryable()),
        "first attempt should fail retryably, got {lost:?}"
    );

    let retried = service.submit_response(request).await?;
    let history = service.queries().history(task.id()).await?;

    eyre::ensure!(store.commits() == 1, "retry must not write again");
    eyre::ensure!(history.responses == vec![retried]);
    eyre::ensure!(history.task.status() == Status::Review);
    eyre::ensure!(history.task.version() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replay_returns_the_original_receipt(service: MemoryService) -> Result<(), eyre::Report> {
    let task = seed_task(&service, &["alice"]).await?;
    let request = TransitionRequest::new(
        task.id(),
        Actor::assignee(user("alice")),
        ActionPayload::StartWork,
    )
    .with_idempotency_key(IdempotencyKey::new("start-1")?);

    let first = service.apply(request.clone()).await?;
    let again = service.apply(request).await?;

    eyre::ensure!(!first.is_replay());
    eyre::ensure!(again.is_replay());
    eyre::ensure!(again.receipt() == first.receipt());
    eyre::ensure!(again.receipt().action() == Action::StartWork);
    eyre::ensure!(again.snapshot().task().version() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reused_key_under_another_role_is_forbidden(
    service: MemoryService,
) -> Result<(), eyre::Report> {
    let task = seed_task(&service, &["alice"]).await?;
    let key = IdempotencyKey::new("start-1")?;
    service
        .apply(
            TransitionRequest::new(
                task.id(),
                Actor::assignee(user("alice")),
                ActionPayload::StartWork,
            )
            .with_idempotency_key(key.clone()),
        )
        .await?;

    let retried = service
        .apply(
            TransitionRequest::new(
                task.id(),
                Actor::new(user("alice"), ActorRole::Reviewer),
                ActionPayload::StartWork,
            )
            .with_idempotency_key(key),
        )
        .await;

    eyre::ensure!(
        matches!(
            retried,
            Err(WorkflowError::Forbidden {
                operation: "start_work",
                ..
            })
        ),
        "expected Forbidden, got {retried:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replay_reports_the_current_snapshot(service: MemoryService) -> Result<(), eyre::Report> {
    let task = seed_task(&service, &["alice"]).await?;
    let submit = SubmitResponseRequest::new(task.id(), user("alice"), "survey attached")
        .with_idempotency_key(IdempotencyKey::new("alice-submit-1")?);
    let response = service.submit_response(submit.clone()).await?;
    service
        .submit_review(SubmitReviewRequest::new(
            response.id(),
            user("rita"),
            ReviewDecision::Approve,
            "",
        ))
        .await?;

    let replayed = service.submit_response(submit).await?;
    let snapshot = service.get_snapshot(task.id()).await?;

    eyre::ensure!(replayed.id() == response.id());
    eyre::ensure!(snapshot.task().status() == Status::FinalReview);
    eyre::ensure!(service.queries().history(task.id()).await?.responses.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reused_key_with_different_payload_conflicts(
    service: MemoryService,
) -> Result<(), eyre::Report> {
    let task = seed_task(&service, &["alice"]).await?;
    let key = IdempotencyKey::new("alice-submit-1")?;
    service
        .submit_response(
            SubmitResponseRequest::new(task.id(), user("alice"), "first answer")
                .with_idempotency_key(key.clone()),
        )
        .await?;

    let result = service
        .submit_response(
            SubmitResponseRequest::new(task.id(), user("alice"), "second answer")
                .with_idempotency_key(key.clone()),
        )
        .await;

    eyre::ensure!(matches!(
        result,
        Err(WorkflowError::IdempotencyConflict { task_id, key: ref reused })
            if task_id == task.id() && *reused == key
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_keys_are_independent_requests(service: MemoryService) -> Result<(), eyre::Report> {
    let task = seed_task(&service, &["alice"]).await?;
    let request = SubmitResponseRequest::new(task.id(), user("alice"), "survey attached");

    service.submit_response(request.clone()).await?;
    let second = service.submit_response(request).await;

    eyre::ensure!(matches!(second, Err(WorkflowError::AlreadySubmitted(id)) if id == task.id()));
    Ok(())
}
