//! Listings and setup records against a real `PostgreSQL` database.

use super::helpers::{TestDatabase, seed_task, service_over, test_runtime, user};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use signoff::{
    config::WorkflowConfig,
    workflow::{
        domain::{Project, Status, Task},
        ports::{WorkflowStore, WorkflowStoreError},
        services::{
            ReviewDecision, StatusQuery, SubmitResponseRequest, SubmitReviewRequest,
            WorkflowRecord,
        },
    },
};
use std::{sync::Arc, time::Duration};

#[rstest]
fn responses_are_listed_oldest_first_across_tasks(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "ordering")?;
    let service = service_over(Arc::new(database.store()?), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let earlier_task = seed_task(&service, &["alice"]).await?;
        let later_task = seed_task(&service, &["bob"]).await?;
        let first = service
            .submit_response(SubmitResponseRequest::new(later_task.id(), user("bob")?, "b"))
            .await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = service
            .submit_response(SubmitResponseRequest::new(
                earlier_task.id(),
                user("alice")?,
                "a",
            ))
            .await?;

        let listed = service
            .queries()
            .list_by_status(StatusQuery::Responses(Status::Review))
            .await?;
        let ids: Vec<_> = listed
            .iter()
            .filter_map(|record| match record {
                WorkflowRecord::Response(response) => Some(response.id()),
                _ => None,
            })
            .collect();

        eyre::ensure!(
            ids == vec![first.id(), second.id()],
            "responses not oldest first: {ids:?}"
        );
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn assignee_listing_uses_array_membership(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "assignees")?;
    let service = service_over(Arc::new(database.store()?), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let shared = seed_task(&service, &["alice", "bob"]).await?;
        let solo = seed_task(&service, &["carol"]).await?;

        let for_bob = service.queries().tasks_for_assignee(&user("bob")?).await?;
        let for_carol = service.queries().tasks_for_assignee(&user("carol")?).await?;
        let for_nobody = service.queries().tasks_for_assignee(&user("dave")?).await?;

        eyre::ensure!(for_bob.iter().map(Task::id).collect::<Vec<_>>() == vec![shared.id()]);
        eyre::ensure!(for_carol.iter().map(Task::id).collect::<Vec<_>>() == vec![solo.id()]);
        eyre::ensure!(for_nobody.is_empty());
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn storing_a_project_twice_is_a_duplicate(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "projects")?;
    let store = database.store()?;
    let rt = test_runtime()?;

    rt.block_on(async {
        let project = Project::new("Feeder rebuild", user("tech")?, &DefaultClock)?;
        store.store_project(&project).await?;

        let again = store.store_project(&project).await;
        let found = store.find_project(project.id()).await?;

        eyre::ensure!(
            matches!(again, Err(WorkflowStoreError::DuplicateRecord { .. })),
            "expected a duplicate, got {again:?}"
        );
        eyre::ensure!(found.map(|stored| stored.id()) == Some(project.id()));
        Ok::<_, eyre::Report>(())
    })
}

#[rstest]
fn rejected_history_survives_a_round_trip(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TestDatabase::create(shared_test_cluster, "history")?;
    let service = service_over(Arc::new(database.store()?), WorkflowConfig::default());
    let rt = test_runtime()?;

    rt.block_on(async {
        let task = seed_task(&service, &["alice"]).await?;
        let draft = service
            .submit_response(SubmitResponseRequest::new(task.id(), user("alice")?, "draft"))
            .await?;
        service
            .submit_review(SubmitReviewRequest::new(
                draft.id(),
                user("rita")?,
                ReviewDecision::Reject,
                "missing cable sizes",
            ))
            .await?;
        let revised = service
            .submit_response(SubmitResponseRequest::new(task.id(), user("alice")?, "sized"))
            .await?;

        let history = service.queries().history(task.id()).await?;
        let responses: Vec<_> = history
            .responses
            .iter()
            .map(|response| (response.id(), response.status()))
            .collect();

        eyre::ensure!(
            responses
                == vec![
                    (draft.id(), Status::Rejected),
                    (revised.id(), Status::Review),
                ]
        );
        eyre::ensure!(history.reviews.len() == 1);
        eyre::ensure!(history.task.version() == 3);
        Ok::<_, eyre::Report>(())
    })
}
