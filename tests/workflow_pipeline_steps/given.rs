//! Given steps for approval pipeline BDD scenarios.

use super::world::{PipelineWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use signoff::workflow::{
    domain::UserId,
    services::{ReviewDecision, SubmitFinalRequest, SubmitResponseRequest, SubmitReviewRequest},
};

fn first_assignee(world: &PipelineWorld) -> Result<UserId, eyre::Report> {
    let assignee = world
        .task()?
        .assignees()
        .iter()
        .next()
        .ok_or_else(|| eyre::eyre!("task has no assignees"))?;
    Ok(UserId::new(assignee)?)
}

#[given(r#"a task assigned to "{assignee}""#)]
fn task_assigned_to(world: &mut PipelineWorld, assignee: String) -> Result<(), eyre::Report> {
    world
        .create_task(&assignee)
        .wrap_err("create task for pipeline scenario")
}

#[given("the task is under review")]
fn task_under_review(world: &mut PipelineWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let assignee = first_assignee(world)?;
    run_async(world.service.submit_response(SubmitResponseRequest::new(
        task_id,
        assignee,
        "survey attached",
    )))
    .wrap_err("submit response in scenario setup")?;
    Ok(())
}

#[given("the task is awaiting final approval")]
fn task_awaiting_final_approval(world: &mut PipelineWorld) -> Result<(), eyre::Report> {
    task_under_review(world)?;
    let response_id = world.active_response_id()?;
    run_async(world.service.submit_review(SubmitReviewRequest::new(
        response_id,
        UserId::new("rita")?,
        ReviewDecision::Approve,
        "",
    )))
    .wrap_err("approve response in scenario setup")?;
    Ok(())
}

#[given("the task is closed")]
fn task_closed(world: &mut PipelineWorld) -> Result<(), eyre::Report> {
    task_awaiting_final_approval(world)?;
    let review_id = world.active_review_id()?;
    run_async(world.service.submit_final(SubmitFinalRequest::new(
        review_id,
        UserId::new("fred")?,
        ReviewDecision::Approve,
        "ship it",
    )))
    .wrap_err("approve final review in scenario setup")?;
    Ok(())
}
