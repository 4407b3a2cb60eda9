//! Tests for [`InMemoryIssueRepository`].
//!
//! Covers batch atomicity, optimistic version checks and deletion with rank
//! compaction.

use crate::in_memory::helpers::{
    change_set, clock, column_of, issues, place, project, runtime, snapshot, sprint_for,
};
use mockable::Clock;
use rstest::rstest;
use sprintboard::board::{
    adapters::memory::{FixedClock, InMemoryIssueRepository},
    domain::{IssuePriority, IssueStatus, Project, compact_after_removal},
    ports::{BoardRepositoryError, IssueRepository},
};
use std::io;
use tokio::runtime::Runtime;

#[rstest]
fn duplicate_issue_is_rejected(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A"], &clock);
    let issue = seeded.first().expect("one issue");

    rt.block_on(issues.store(issue)).expect("first store");
    let result = rt.block_on(issues.store(issue));

    assert!(
        matches!(result, Err(BoardRepositoryError::DuplicateIssue(id)) if id == issue.id()),
        "second store should be rejected, got {result:?}"
    );
}

#[rstest]
fn find_by_sprint_only_returns_that_sprint(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let other = sprint_for(&project, &clock);
    for issue in column_of(&sprint, IssueStatus::Todo, &["A", "B"], &clock)
        .iter()
        .chain(column_of(&other, IssueStatus::Todo, &["X"], &clock).iter())
    {
        rt.block_on(issues.store(issue)).expect("store");
    }

    let found = rt
        .block_on(issues.find_by_sprint(sprint.id()))
        .expect("find by sprint");

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|issue| issue.sprint_id() == sprint.id()));
}

#[rstest]
fn batch_applies_every_row_and_bumps_versions(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A", "B"], &clock);
    for issue in &seeded {
        rt.block_on(issues.store(issue)).expect("store");
    }
    let [a, b] = seeded.as_slice() else {
        panic!("expected two issues");
    };

    let changes = change_set(
        &sprint,
        vec![
            place(a, IssueStatus::InProgress, 0),
            place(b, IssueStatus::Todo, 0),
        ],
    );
    rt.block_on(issues.persist_batch(&changes, clock.utc()))
        .expect("batch commit");

    let moved = rt
        .block_on(issues.find_by_id(a.id()))
        .expect("lookup")
        .expect("issue a present");
    assert_eq!(moved.status(), IssueStatus::InProgress);
    assert_eq!(moved.rank(), 0);
    assert_eq!(moved.version(), 1);
    assert_eq!(moved.updated_at(), clock.utc());

    let shifted = rt
        .block_on(issues.find_by_id(b.id()))
        .expect("lookup")
        .expect("issue b present");
    assert_eq!(shifted.rank(), 0);
    assert_eq!(shifted.version(), 1);
}

#[rstest]
fn stale_row_rolls_back_the_whole_batch(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A", "B", "C"], &clock);
    for issue in &seeded {
        rt.block_on(issues.store(issue)).expect("store");
    }
    let [a, b, c] = seeded.as_slice() else {
        panic!("expected three issues");
    };
    let before = snapshot(&rt.block_on(issues.find_by_sprint(sprint.id())).expect("find"));

    let mut stale = place(c, IssueStatus::Todo, 0);
    stale.expected_version = 7;
    let changes = change_set(
        &sprint,
        vec![
            place(a, IssueStatus::Todo, 1),
            place(b, IssueStatus::Todo, 2),
            stale,
        ],
    );
    let result = rt.block_on(issues.persist_batch(&changes, clock.utc()));

    assert!(
        matches!(
            result,
            Err(BoardRepositoryError::VersionConflict { issue_id, expected: 7, actual: 0 })
                if issue_id == c.id()
        ),
        "expected a version conflict, got {result:?}"
    );
    let after = snapshot(&rt.block_on(issues.find_by_sprint(sprint.id())).expect("find"));
    assert_eq!(before, after, "no row may change after a failed batch");
}

#[rstest]
fn injected_failure_leaves_rows_untouched(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A", "B"], &clock);
    for issue in &seeded {
        rt.block_on(issues.store(issue)).expect("store");
    }
    let before = snapshot(&seeded);
    let changes = change_set(
        &sprint,
        seeded
            .iter()
            .rev()
            .zip(0_u32..)
            .map(|(issue, rank)| place(issue, IssueStatus::Todo, rank))
            .collect(),
    );

    issues.fail_next_batch_after(1).expect("inject failure");
    let failed = rt.block_on(issues.persist_batch(&changes, clock.utc()));
    assert!(matches!(failed, Err(BoardRepositoryError::Persistence(_))));
    let after = snapshot(&rt.block_on(issues.find_by_sprint(sprint.id())).expect("find"));
    assert_eq!(before, after);

    rt.block_on(issues.persist_batch(&changes, clock.utc()))
        .expect("the injected failure is consumed by one batch");
}

#[rstest]
fn batch_rejects_issue_from_another_sprint(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let other = sprint_for(&project, &clock);
    let foreign = column_of(&other, IssueStatus::Todo, &["X"], &clock);
    let issue = foreign.first().expect("one issue");
    rt.block_on(issues.store(issue)).expect("store");

    let changes = change_set(&sprint, vec![place(issue, IssueStatus::Done, 0)]);
    let result = rt.block_on(issues.persist_batch(&changes, clock.utc()));

    assert!(
        matches!(
            result,
            Err(BoardRepositoryError::SprintMismatch { issue_id, sprint_id })
                if issue_id == issue.id() && sprint_id == sprint.id()
        ),
        "expected a sprint mismatch, got {result:?}"
    );
}

#[rstest]
fn batch_rejects_unknown_issue(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let unsaved = column_of(&sprint, IssueStatus::Todo, &["ghost"], &clock);
    let ghost = unsaved.first().expect("one issue");

    let changes = change_set(&sprint, vec![place(ghost, IssueStatus::Done, 0)]);
    let result = rt.block_on(issues.persist_batch(&changes, clock.utc()));

    assert!(matches!(
        result,
        Err(BoardRepositoryError::IssueNotFound(id)) if id == ghost.id()
    ));
}

#[rstest]
fn update_details_checks_and_bumps_version(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A"], &clock);
    let original = seeded.first().expect("one issue");
    rt.block_on(issues.store(original)).expect("store");

    let mut edited = original.clone();
    edited.set_priority(IssuePriority::High, &clock);
    let stored = rt
        .block_on(issues.update_details(&edited))
        .expect("first update");
    assert_eq!(stored.priority(), IssuePriority::High);
    assert_eq!(stored.version(), 1);

    let mut stale = original.clone();
    stale.set_priority(IssuePriority::Low, &clock);
    let result = rt.block_on(issues.update_details(&stale));
    assert!(matches!(
        result,
        Err(BoardRepositoryError::VersionConflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
}

#[rstest]
fn delete_compacts_the_column_in_one_step(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A", "B", "C"], &clock);
    for issue in &seeded {
        rt.block_on(issues.store(issue)).expect("store");
    }
    let [_, b, _] = seeded.as_slice() else {
        panic!("expected three issues");
    };

    let compaction = compact_after_removal(&seeded, b);
    rt.block_on(issues.delete(b, &compaction, clock.utc()))
        .expect("delete");

    let remaining = rt
        .block_on(issues.find_by_sprint(sprint.id()))
        .expect("find");
    let mut ranks: Vec<(String, u32)> = remaining
        .iter()
        .map(|issue| (issue.title().to_owned(), issue.rank()))
        .collect();
    ranks.sort_by_key(|(_, rank)| *rank);
    assert_eq!(ranks, vec![("A".to_owned(), 0), ("C".to_owned(), 1)]);
}

#[rstest]
fn failed_delete_keeps_the_issue(
    runtime: io::Result<Runtime>,
    issues: InMemoryIssueRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    let sprint = sprint_for(&project, &clock);
    let seeded = column_of(&sprint, IssueStatus::Todo, &["A", "B", "C"], &clock);
    for issue in &seeded {
        rt.block_on(issues.store(issue)).expect("store");
    }
    let first = seeded.first().expect("issue a");

    let compaction = compact_after_removal(&seeded, first);
    issues.fail_next_batch_after(0).expect("inject failure");
    let result = rt.block_on(issues.delete(first, &compaction, clock.utc()));

    assert!(matches!(result, Err(BoardRepositoryError::Persistence(_))));
    let still_there = rt.block_on(issues.find_by_id(first.id())).expect("lookup");
    assert!(still_there.is_some(), "failed delete must not remove the row");
}
