//! Then steps for sprint board BDD scenarios.

use super::world::{SprintBoardWorld, column, run_async, title_list};
use eyre::WrapErr;
use rstest_bdd_macros::then;
use sprintboard::board::{
    domain::SprintStatus,
    services::{BoardServiceError, BoardServiceResult},
};

fn failure_kind<T: std::fmt::Debug>(
    result: Option<&BoardServiceResult<T>>,
    expected: &str,
) -> Result<(), eyre::Report> {
    match result {
        None => Err(eyre::eyre!("no result recorded in scenario world")),
        Some(Ok(value)) => Err(eyre::eyre!("expected {expected} failure, got {value:?}")),
        Some(Err(err)) if BoardServiceError::kind(err).as_str() == expected => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!(
            "expected {expected} failure, got {} ({err})",
            err.kind()
        )),
    }
}

fn assert_column(
    world: &SprintBoardWorld,
    status: &str,
    expected: &[String],
) -> Result<(), eyre::Report> {
    let status = column(status)?;
    let sprint_id = world.sprint()?.id();
    let board = run_async(world.boards.get_board(sprint_id)).wrap_err("fetch board")?;
    let actual: Vec<String> = board
        .column(status)
        .map(|col| col.issues().iter().map(|i| i.title().to_owned()).collect())
        .unwrap_or_default();
    if actual != expected {
        return Err(eyre::eyre!(
            "column {status}: expected {expected:?}, found {actual:?}"
        ));
    }
    Ok(())
}

#[then(r#"the "{status}" column reads "{titles}""#)]
fn column_reads(
    world: &SprintBoardWorld,
    status: String,
    titles: String,
) -> Result<(), eyre::Report> {
    assert_column(world, &status, &title_list(&titles))
}

#[then(r#"the "{status}" column is empty"#)]
fn column_is_empty(world: &SprintBoardWorld, status: String) -> Result<(), eyre::Report> {
    assert_column(world, &status, &[])
}

#[then("every column has dense ranks")]
fn every_column_dense(world: &SprintBoardWorld) -> Result<(), eyre::Report> {
    let sprint_id = world.sprint()?.id();
    let board = run_async(world.boards.get_board(sprint_id)).wrap_err("fetch board")?;
    if !board.is_dense() {
        return Err(eyre::eyre!("ranks are not dense: {board:?}"));
    }
    Ok(())
}

#[then("the change set is empty")]
fn change_set_is_empty(world: &SprintBoardWorld) -> Result<(), eyre::Report> {
    let changes = world
        .pending_changes
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing change set"))?;
    if !changes.is_empty() {
        return Err(eyre::eyre!("expected no changes, got {changes:?}"));
    }
    Ok(())
}

#[then(r#"the commit fails with "{kind}""#)]
fn commit_fails_with(world: &SprintBoardWorld, kind: String) -> Result<(), eyre::Report> {
    failure_kind(world.last_commit.as_ref(), &kind)
}

#[then(r#"the transition fails with "{kind}""#)]
fn transition_fails_with(world: &SprintBoardWorld, kind: String) -> Result<(), eyre::Report> {
    failure_kind(world.last_transition.as_ref(), &kind)
}

#[then(r#"the sprint status is "{status}""#)]
fn sprint_status_is(world: &SprintBoardWorld, status: String) -> Result<(), eyre::Report> {
    let expected = SprintStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let sprint_id = world.sprint()?.id();
    let stored = run_async(world.lifecycle.find_sprint(sprint_id)).wrap_err("fetch sprint")?;
    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected sprint status {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}
