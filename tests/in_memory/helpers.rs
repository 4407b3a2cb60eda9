//! Shared test helpers for in-memory adapter integration tests.

use chrono::{TimeZone, Utc};
use rstest::fixture;
use sprintboard::board::{
    adapters::memory::{FixedClock, InMemoryIssueRepository, InMemorySprintRepository},
    domain::{
        ActorId, ChangeSet, Issue, IssueDraft, IssueId, IssueStatus, OrganizationId, Project,
        ProjectId, RankChange, Sprint,
    },
};
use std::io;
use tokio::runtime::Runtime;

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Provides a clock pinned inside the default sprint window.
#[fixture]
pub fn clock() -> FixedClock {
    FixedClock::at(
        Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0)
            .single()
            .expect("valid timestamp"),
    )
}

/// Provides a fresh issue repository for each test.
#[fixture]
pub fn issues() -> InMemoryIssueRepository {
    InMemoryIssueRepository::new()
}

/// Provides a fresh sprint repository for each test.
#[fixture]
pub fn sprints() -> InMemorySprintRepository {
    InMemorySprintRepository::new()
}

/// Provides a project owned by `org-acme`.
#[fixture]
pub fn project() -> Project {
    Project::new(
        ProjectId::new(),
        "FB",
        "Feedback",
        OrganizationId::new("org-acme"),
    )
}

/// Builds a planned sprint for `project` spanning the first half of October.
#[must_use]
pub fn sprint_for(project: &Project, clock: &FixedClock) -> Sprint {
    Sprint::new(
        "Sprint 1",
        Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0)
            .single()
            .expect("valid start"),
        Utc.with_ymd_and_hms(2026, 10, 14, 23, 59, 59)
            .single()
            .expect("valid end"),
        project.id(),
        clock,
    )
    .expect("valid sprint")
}

/// Builds one issue per title in `status`, ranked in order.
#[must_use]
pub fn column_of(
    sprint: &Sprint,
    status: IssueStatus,
    titles: &[&str],
    clock: &FixedClock,
) -> Vec<Issue> {
    titles
        .iter()
        .zip(0_u32..)
        .map(|(title, rank)| {
            let draft = IssueDraft::new(
                *title,
                sprint.id(),
                sprint.project_id(),
                ActorId::new("user-reporter"),
            )
            .expect("valid draft")
            .with_status(status);
            Issue::new(draft, rank, clock)
        })
        .collect()
}

/// Placement of `issue` at `status`/`rank`, expecting its current version.
#[must_use]
pub fn place(issue: &Issue, status: IssueStatus, rank: u32) -> RankChange {
    RankChange {
        issue_id: issue.id(),
        status,
        rank,
        expected_version: issue.version(),
    }
}

/// Bundles placements into a change set for `sprint`.
#[must_use]
pub fn change_set(sprint: &Sprint, changes: Vec<RankChange>) -> ChangeSet {
    ChangeSet::new(sprint.id(), changes)
}

/// Returns `(id, status, rank, version)` for each issue, sorted by id.
#[must_use]
pub fn snapshot(issues: &[Issue]) -> Vec<(IssueId, IssueStatus, u32, u64)> {
    let mut rows: Vec<_> = issues
        .iter()
        .map(|issue| (issue.id(), issue.status(), issue.rank(), issue.version()))
        .collect();
    rows.sort_by_key(|row| row.0);
    rows
}
