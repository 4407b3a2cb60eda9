//! Builders shared by the board unit tests.

use crate::board::domain::{
    ActorId, Board, BoardColumns, BoardPosition, Issue, IssueId, IssueMove, IssuePriority,
    IssueStatus, PersistedIssueData, PersistedSprintData, ProjectId, Sprint, SprintId,
    SprintStatus,
};
use chrono::{DateTime, TimeZone, Utc};

pub(super) fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid test date")
}

pub(super) fn reporter() -> ActorId {
    ActorId::new("user-reporter")
}

/// Sprint running 2026-10-01 to 2026-10-14 in `status`.
pub(super) fn sprint_with_status(status: SprintStatus) -> Sprint {
    Sprint::from_persisted(PersistedSprintData {
        id: SprintId::new(),
        name: "Sprint 12".to_owned(),
        start_date: at(2026, 10, 1),
        end_date: at(2026, 10, 14),
        status,
        project_id: ProjectId::new(),
        created_at: at(2026, 9, 28),
        updated_at: at(2026, 9, 28),
    })
}

pub(super) fn issue_with_id(
    sprint: &Sprint,
    id: IssueId,
    title: &str,
    status: IssueStatus,
    rank: u32,
) -> Issue {
    Issue::from_persisted(PersistedIssueData {
        id,
        title: title.to_owned(),
        description: None,
        status,
        priority: IssuePriority::Medium,
        rank,
        version: 0,
        sprint_id: sprint.id(),
        project_id: sprint.project_id(),
        assignee: None,
        reporter: reporter(),
        created_at: at(2026, 9, 29),
        updated_at: at(2026, 9, 29),
    })
}

pub(super) fn issue_at(sprint: &Sprint, title: &str, status: IssueStatus, rank: u32) -> Issue {
    issue_with_id(sprint, IssueId::new(), title, status, rank)
}

/// Builds issues whose ranks follow their position in each title list.
pub(super) fn issues_of(sprint: &Sprint, layout: &[(IssueStatus, &[&str])]) -> Vec<Issue> {
    layout
        .iter()
        .flat_map(|&(status, titles)| {
            titles.iter().enumerate().map(move |(index, title)| {
                let rank = u32::try_from(index).expect("small test column");
                issue_at(sprint, title, status, rank)
            })
        })
        .collect()
}

pub(super) fn board_of(sprint: &Sprint, layout: &[(IssueStatus, &[&str])]) -> Board {
    Board::materialize(sprint, issues_of(sprint, layout), &BoardColumns::default())
}

pub(super) fn titles(board: &Board, status: IssueStatus) -> Vec<String> {
    board
        .column(status)
        .map(|column| {
            column
                .issues()
                .iter()
                .map(|issue| issue.title().to_owned())
                .collect()
        })
        .unwrap_or_default()
}

pub(super) fn find_by_title<'a>(board: &'a Board, title: &str) -> &'a Issue {
    board
        .columns()
        .iter()
        .flat_map(|column| column.issues().iter())
        .find(|issue| issue.title() == title)
        .expect("issue present on board")
}

pub(super) const fn move_between(
    from_status: IssueStatus,
    from_index: usize,
    to_status: IssueStatus,
    to_index: usize,
) -> IssueMove {
    IssueMove::new(
        BoardPosition::new(from_status, from_index),
        BoardPosition::new(to_status, to_index),
    )
}
