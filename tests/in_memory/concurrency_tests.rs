//! In-memory integration tests for competing writers.

use super::helpers::{Fault, FaultyStore, MemoryService, faulty_service, seed_task, service, user};
use signoff::{
    config::WorkflowConfig,
    workflow::{
        domain::{ActionPayload, Actor, Status, TransitionRequest},
        services::{
            ReviewDecision, SubmitResponseRequest, SubmitReviewRequest, WorkflowError,
            WorkflowService,
        },
    },
};
use mockable::DefaultClock;
use rstest::rstest;
use std::{sync::Arc, time::Duration};

fn is_loser(result: &Result<impl std::fmt::Debug, WorkflowError>) -> bool {
    matches!(
        result,
        Err(WorkflowError::InvalidTransition { .. }
            | WorkflowError::AlreadySubmitted(_)
            | WorkflowError::Busy(_))
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn competing_review_decisions_have_one_winner(
    service: MemoryService,
) -> Result<(), eyre::Report> {
    let task = seed_task(&service, &["alice"]).await?;
    let response = service
        .submit_response(SubmitResponseRequest::new(task.id(), user("alice"), "done"))
        .await?;

    let approver = service.clone();
    let rejecter = service.clone();
    let response_id = response.id();
    let approve = tokio::spawn(async move {
        approver
            .submit_review(SubmitReviewRequest::new(
                response_id,
                user("rita"),
                ReviewDecision::Approve,
                "",
            ))
            .await
    });
    let reject = tokio::spawn(async move {
        rejecter
            .submit_review(SubmitReviewRequest::new(
                response_id,
                user("ray"),
                ReviewDecision::Reject,
                "incomplete",
            ))
            .await
    });
    let approved = approve.await?;
    let rejected = reject.await?;

    let snapshot = service.get_snapshot(task.id()).await?;
    snapshot.check_consistency()?;
    match (&approved, &rejected) {
        (Ok(_), loser) => {
            eyre::ensure!(is_loser(loser), "unexpected loser result {loser:?}");
            eyre::ensure!(snapshot.task().status() == Status::FinalReview);
        }
        (loser, Ok(_)) => {
            eyre::ensure!(is_loser(loser), "unexpected loser result {loser:?}");
            eyre::ensure!(snapshot.task().status() == Status::InProgress);
        }
        _ => eyre::bail!("no decision won: {approved:?} / {rejected:?}"),
    }
    eyre::ensure!(snapshot.task().version() == 2);
    eyre::ensure!(service.queries().history(task.id()).await?.reviews.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_submissions_store_one_response(
    service: MemoryService,
) -> Result<(), eyre::Report> {
    let assignees = ["alice", "bob", "carol", "dave"];
    let task = seed_task(&service, &assignees).await?;

    let handles: Vec<_> = assignees
        .iter()
        .map(|name| {
            let worker = service.clone();
            let request =
                SubmitResponseRequest::new(task.id(), user(name), format!("{name}'s answer"));
            tokio::spawn(async move { worker.submit_response(request).await })
        })
        .collect();
    let mut winners = 0;
    for handle in handles {
        let result = handle.await?;
        if result.is_ok() {
            winners += 1;
        } else {
            eyre::ensure!(is_loser(&result), "unexpected result {result:?}");
        }
    }

    let history = service.queries().history(task.id()).await?;
    eyre::ensure!(winners == 1);
    eyre::ensure!(history.responses.len() == 1);
    eyre::ensure!(history.task.status() == Status::Review);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_coordinators_race_on_version() -> Result<(), eyre::Report> {
    let store = Arc::new(FaultyStore::new(Fault::SlowCommit(Duration::from_millis(20))));
    let first: WorkflowService<FaultyStore, DefaultClock> =
        faulty_service(&store, WorkflowConfig::default());
    let second = faulty_service(&store, WorkflowConfig::default());
    let task = seed_task(&first, &["alice"]).await?;

    let start = |service: WorkflowService<FaultyStore, DefaultClock>| {
        let request = TransitionRequest::new(
            task.id(),
            Actor::assignee(user("alice")),
            ActionPayload::StartWork,
        );
        tokio::spawn(async move { service.apply(request).await })
    };
    let left_handle = start(first.clone());
    let right_handle = start(second);
    let left = left_handle.await?;
    let right = right_handle.await?;

    let outcomes = [left.is_ok(), right.is_ok()];
    eyre::ensure!(
        outcomes.iter().filter(|won| **won).count() == 1,
        "exactly one coordinator should win"
    );
    let snapshot = first.get_snapshot(task.id()).await?;
    eyre::ensure!(snapshot.task().status() == Status::InProgress);
    eyre::ensure!(snapshot.task().version() == 1);
    eyre::ensure!(store.commits() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lock_wait_times_out_as_busy() -> Result<(), eyre::Report> {
    let store = Arc::new(FaultyStore::new(Fault::SlowCommit(Duration::from_millis(300))));
    let config = WorkflowConfig::default().with_lock_timeout_ms(20);
    let service = faulty_service(&store, config);
    let task = seed_task(&service, &["alice", "bob"]).await?;

    let slow = service.clone();
    let task_id = task.id();
    let holder = tokio::spawn(async move { slow.start_work(task_id, user("alice"), None).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let waiting = service.start_work(task_id, user("bob"), None).await;
    let held = holder.await?;

    eyre::ensure!(held.is_ok());
    eyre::ensure!(
        matches!(waiting, Err(WorkflowError::Busy(id)) if id == task_id),
        "expected Busy, got {waiting:?}"
    );
    Ok(())
}
