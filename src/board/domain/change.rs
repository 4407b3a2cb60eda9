//! Move descriptors and the change sets produced by applying them.

use super::{IssueId, IssueStatus, MoveError, SprintId};
use serde::{Deserialize, Serialize};

/// A slot on the board: a column and a zero-based index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardPosition {
    /// Column key.
    pub status: IssueStatus,
    /// Zero-based index within the column.
    pub index: usize,
}

impl BoardPosition {
    /// Creates a position.
    #[must_use]
    pub const fn new(status: IssueStatus, index: usize) -> Self {
        Self { status, index }
    }
}

/// A drag from one board position to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueMove {
    /// Where the dragged issue currently sits.
    pub source: BoardPosition,
    /// Where it was dropped.
    pub destination: BoardPosition,
}

impl IssueMove {
    /// Creates a move between two typed positions.
    #[must_use]
    pub const fn new(source: BoardPosition, destination: BoardPosition) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Builds a move from raw column keys, as delivered by a drag event.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::UnknownColumn`] when either key is not a known
    /// status.
    pub fn parse(
        source_status: &str,
        source_index: usize,
        destination_status: &str,
        destination_index: usize,
    ) -> Result<Self, MoveError> {
        let source = IssueStatus::try_from(source_status)
            .map_err(|_| MoveError::UnknownColumn(source_status.to_owned()))?;
        let destination = IssueStatus::try_from(destination_status)
            .map_err(|_| MoveError::UnknownColumn(destination_status.to_owned()))?;
        Ok(Self::new(
            BoardPosition::new(source, source_index),
            BoardPosition::new(destination, destination_index),
        ))
    }

    /// Returns whether the issue was dropped where it was picked up.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.source == self.destination
    }

    /// Returns whether source and destination share a column.
    #[must_use]
    pub fn is_same_column(&self) -> bool {
        self.source.status == self.destination.status
    }
}

/// New placement of a single issue, to be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankChange {
    /// Issue being placed.
    pub issue_id: IssueId,
    /// Column the issue ends up in.
    pub status: IssueStatus,
    /// Rank the issue ends up with.
    pub rank: u32,
    /// Row version the change was computed against.
    pub expected_version: u64,
}

/// Minimal set of placements produced by one board mutation.
///
/// Change sets are committed all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    sprint_id: SprintId,
    revision: u64,
    changes: Vec<RankChange>,
}

impl ChangeSet {
    /// Creates a change set for a sprint board.
    #[must_use]
    pub const fn new(sprint_id: SprintId, changes: Vec<RankChange>) -> Self {
        Self {
            sprint_id,
            revision: 0,
            changes,
        }
    }

    /// Creates an empty change set.
    #[must_use]
    pub const fn empty(sprint_id: SprintId) -> Self {
        Self::new(sprint_id, Vec::new())
    }

    /// Stamps the local board revision the change set belongs to.
    #[must_use]
    pub const fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Returns the sprint whose board produced the changes.
    #[must_use]
    pub const fn sprint_id(&self) -> SprintId {
        self.sprint_id
    }

    /// Returns the local board revision, or zero when unstamped.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the placements.
    #[must_use]
    pub fn changes(&self) -> &[RankChange] {
        &self.changes
    }

    /// Returns whether nothing needs persisting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of placements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns the placement for `issue_id`, if it changed.
    #[must_use]
    pub fn change_for(&self, issue_id: IssueId) -> Option<&RankChange> {
        self.changes.iter().find(|change| change.issue_id == issue_id)
    }
}
