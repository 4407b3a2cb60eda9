//! Read-only filtering of a materialized board.

use super::{ActorId, Board, Issue, IssuePriority, IssueStatus};

/// Criteria narrowing which issues are displayed.
///
/// An empty filter matches everything. Filtering never changes the
/// underlying board, so moves must always be expressed against the
/// unfiltered board's indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    search: Option<String>,
    assignees: Vec<ActorId>,
    priority: Option<IssuePriority>,
}

impl BoardFilter {
    /// Creates a filter matching every issue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to issues whose title contains `term`, ignoring case.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let raw = term.into();
        let trimmed = raw.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_lowercase());
        self
    }

    /// Restricts to issues assigned to any of `assignees`.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = ActorId>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Restricts to issues with exactly `priority`.
    #[must_use]
    pub const fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Returns whether any criterion is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.search.is_some() || !self.assignees.is_empty() || self.priority.is_some()
    }

    /// Returns whether `issue` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        let search_ok = self
            .search
            .as_ref()
            .is_none_or(|term| issue.title().to_lowercase().contains(term.as_str()));
        let assignee_ok = self.assignees.is_empty()
            || issue
                .assignee()
                .is_some_and(|assignee| self.assignees.contains(assignee));
        let priority_ok = self
            .priority
            .is_none_or(|priority| issue.priority() == priority);
        search_ok && assignee_ok && priority_ok
    }
}

/// Column of a [`FilteredBoard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredColumn<'a> {
    /// Column key.
    pub status: IssueStatus,
    /// Display name.
    pub name: &'a str,
    /// Matching issues in rank order.
    pub issues: Vec<&'a Issue>,
}

/// Read-only view of a board restricted by a [`BoardFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredBoard<'a> {
    columns: Vec<FilteredColumn<'a>>,
}

impl<'a> FilteredBoard<'a> {
    pub(crate) fn new(board: &'a Board, filter: &BoardFilter) -> Self {
        let columns = board
            .columns()
            .iter()
            .map(|column| FilteredColumn {
                status: column.status(),
                name: column.name(),
                issues: column
                    .issues()
                    .iter()
                    .filter(|issue| filter.matches(issue))
                    .collect(),
            })
            .collect();
        Self { columns }
    }

    /// Returns the columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[FilteredColumn<'a>] {
        &self.columns
    }

    /// Returns the matching issues of `status`.
    #[must_use]
    pub fn issues(&self, status: IssueStatus) -> &[&'a Issue] {
        self.columns
            .iter()
            .find(|column| column.status == status)
            .map(|column| column.issues.as_slice())
            .unwrap_or_default()
    }

    /// Returns the number of matching issues.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.columns.iter().map(|column| column.issues.len()).sum()
    }
}
