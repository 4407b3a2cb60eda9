//! Ordered board view and its write path.

use super::{
    BoardColumns, BoardDomainError, ChangeSet, Issue, IssueId, IssueMove, IssueStatus, MoveError,
    RankChange, Reordered, Sprint, SprintId, SprintStatus, reorder, sprint::ensure_unlocked,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One column of a materialized board, ordered by rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    status: IssueStatus,
    name: String,
    issues: Vec<Issue>,
}

impl BoardColumn {
    /// Returns the column key.
    #[must_use]
    pub const fn status(&self) -> IssueStatus {
        self.status
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the issues in rank order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Returns the issue identifiers in rank order.
    #[must_use]
    pub fn issue_ids(&self) -> Vec<IssueId> {
        self.issues.iter().map(Issue::id).collect()
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns whether the column holds no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns whether ranks are exactly `0..len`, in order.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.issues
            .iter()
            .enumerate()
            .all(|(index, issue)| u32::try_from(index).is_ok_and(|rank| rank == issue.rank()))
    }
}

/// Derived view of a sprint's issues grouped into ordered columns.
///
/// A board is rebuilt from storage on every fetch and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    sprint_id: SprintId,
    sprint_status: SprintStatus,
    columns: Vec<BoardColumn>,
}

/// Result of applying a move to a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Board after the move.
    pub board: Board,
    /// Placements that differ from the board before the move.
    pub changes: ChangeSet,
}

impl Board {
    /// Groups a sprint's issues into the configured columns.
    ///
    /// Each column is sorted by rank; equal ranks fall back to the issue
    /// identifier so the result is deterministic. Issues whose status is not
    /// part of `layout` are left out.
    #[must_use]
    pub fn materialize(sprint: &Sprint, issues: Vec<Issue>, layout: &BoardColumns) -> Self {
        Self::from_parts(sprint.id(), sprint.status(), issues, layout)
    }

    /// Groups issues into columns for a sprint known only by id and status.
    #[must_use]
    pub fn from_parts(
        sprint_id: SprintId,
        sprint_status: SprintStatus,
        issues: Vec<Issue>,
        layout: &BoardColumns,
    ) -> Self {
        let mut columns: Vec<BoardColumn> = layout
            .definitions()
            .iter()
            .map(|definition| BoardColumn {
                status: definition.status,
                name: definition.name.clone(),
                issues: Vec::new(),
            })
            .collect();

        for issue in issues {
            if let Some(column) = columns
                .iter_mut()
                .find(|column| column.status == issue.status())
            {
                column.issues.push(issue);
            }
        }
        for column in &mut columns {
            column.issues.sort_by(compare_placement);
        }

        Self {
            sprint_id,
            sprint_status,
            columns,
        }
    }

    /// Returns the sprint the board belongs to.
    #[must_use]
    pub const fn sprint_id(&self) -> SprintId {
        self.sprint_id
    }

    /// Returns the sprint status captured when the board was built.
    #[must_use]
    pub const fn sprint_status(&self) -> SprintStatus {
        self.sprint_status
    }

    /// Returns the columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[BoardColumn] {
        &self.columns
    }

    /// Returns the column for `status`, if displayed.
    #[must_use]
    pub fn column(&self, status: IssueStatus) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.status == status)
    }

    /// Returns the issue identifiers of a column in rank order; empty when
    /// the column is not displayed.
    #[must_use]
    pub fn issue_ids(&self, status: IssueStatus) -> Vec<IssueId> {
        self.column(status)
            .map(BoardColumn::issue_ids)
            .unwrap_or_default()
    }

    /// Returns an issue by identifier.
    #[must_use]
    pub fn issue(&self, issue_id: IssueId) -> Option<&Issue> {
        self.columns
            .iter()
            .flat_map(|column| column.issues.iter())
            .find(|issue| issue.id() == issue_id)
    }

    /// Returns the total number of issues on the board.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.columns.iter().map(BoardColumn::len).sum()
    }

    /// Returns whether every column has dense ranks.
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.columns.iter().all(BoardColumn::is_dense)
    }

    /// Applies a move and returns the new board with the placements that
    /// changed.
    ///
    /// A move that drops an issue where it was picked up returns the board
    /// unchanged with an empty change set.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::BoardLocked`] unless the sprint is active,
    /// and [`BoardDomainError::InvalidMove`] when a column is not on the
    /// board or the source index is out of range.
    pub fn apply_move(&self, issue_move: &IssueMove) -> Result<MoveOutcome, BoardDomainError> {
        ensure_unlocked(self.sprint_id, self.sprint_status)?;

        let source = self.require_column(issue_move.source.status)?;
        let destination = self.require_column(issue_move.destination.status)?;

        let reordered = reorder::reorder(source.issues(), destination.issues(), issue_move)?;
        let mut board = self.clone();
        match reordered {
            Reordered::Unchanged => {
                return Ok(MoveOutcome {
                    board,
                    changes: ChangeSet::empty(self.sprint_id),
                });
            }
            Reordered::Within { column } => {
                board.replace_column(issue_move.source.status, column);
            }
            Reordered::Across {
                source: source_issues,
                destination: destination_issues,
            } => {
                board.replace_column(issue_move.source.status, source_issues);
                board.replace_column(issue_move.destination.status, destination_issues);
            }
        }

        let changes = self.diff_touched(&board, issue_move);
        Ok(MoveOutcome {
            board,
            changes: ChangeSet::new(self.sprint_id, changes),
        })
    }

    /// Returns a read-only view restricted to issues matching `filter`.
    #[must_use]
    pub fn filtered(&self, filter: &super::BoardFilter) -> super::FilteredBoard<'_> {
        super::FilteredBoard::new(self, filter)
    }

    /// Bumps the local row versions of issues whose placements were
    /// committed, so later moves carry the versions storage now holds.
    pub(crate) fn record_committed(&mut self, committed: &ChangeSet) {
        for issue in self.columns.iter_mut().flat_map(|column| column.issues.iter_mut()) {
            if committed.change_for(issue.id()).is_some() {
                issue.bump_version();
            }
        }
    }

    fn require_column(&self, status: IssueStatus) -> Result<&BoardColumn, MoveError> {
        self.column(status)
            .ok_or(MoveError::ColumnNotOnBoard(status))
    }

    fn replace_column(&mut self, status: IssueStatus, issues: Vec<Issue>) {
        if let Some(column) = self.columns.iter_mut().find(|column| column.status == status) {
            column.issues = issues;
        }
    }

    /// Compares the touched columns of `after` with `self`, keeping only
    /// issues whose status or rank changed.
    fn diff_touched(&self, after: &Self, issue_move: &IssueMove) -> Vec<RankChange> {
        let mut touched = vec![issue_move.source.status];
        if !issue_move.is_same_column() {
            touched.push(issue_move.destination.status);
        }

        touched
            .into_iter()
            .filter_map(|status| after.column(status))
            .flat_map(|column| column.issues.iter())
            .filter(|issue| {
                self.issue(issue.id()).is_none_or(|before| {
                    before.status() != issue.status() || before.rank() != issue.rank()
                })
            })
            .map(|issue| RankChange {
                issue_id: issue.id(),
                status: issue.status(),
                rank: issue.rank(),
                expected_version: issue.version(),
            })
            .collect()
    }
}

/// Returns the rank a new issue takes in `status`: one past the highest rank
/// present, or zero for an empty column.
#[must_use]
pub fn next_rank(issues: &[Issue], status: IssueStatus) -> u32 {
    issues
        .iter()
        .filter(|issue| issue.status() == status)
        .map(Issue::rank)
        .max()
        .map_or(0, |rank| rank.saturating_add(1))
}

/// Computes the placements that close the gap left by removing `removed`
/// from its column.
///
/// `issues` may contain issues from any column of the sprint; only the
/// removed issue's column is renumbered.
#[must_use]
pub fn compact_after_removal(issues: &[Issue], removed: &Issue) -> Vec<RankChange> {
    let mut survivors: Vec<&Issue> = issues
        .iter()
        .filter(|issue| issue.status() == removed.status() && issue.id() != removed.id())
        .collect();
    survivors.sort_by(|left, right| compare_placement(left, right));

    survivors
        .into_iter()
        .enumerate()
        .filter_map(|(index, issue)| {
            let rank = u32::try_from(index).ok()?;
            (issue.rank() != rank).then_some(RankChange {
                issue_id: issue.id(),
                status: issue.status(),
                rank,
                expected_version: issue.version(),
            })
        })
        .collect()
}

fn compare_placement(left: &Issue, right: &Issue) -> Ordering {
    left.rank()
        .cmp(&right.rank())
        .then_with(|| left.id().cmp(&right.id()))
}
