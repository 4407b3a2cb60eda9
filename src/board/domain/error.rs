//! Error types for board domain validation and parsing.

use super::{IssueStatus, ProjectId, SprintId, SprintStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing or mutating board domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// The issue title is empty after trimming.
    #[error("issue title must not be empty")]
    EmptyIssueTitle,

    /// The sprint name is empty after trimming.
    #[error("sprint name must not be empty")]
    EmptySprintName,

    /// The sprint would end before it starts.
    #[error("sprint start {start} is after its end {end}")]
    InvalidDateRange {
        /// Requested start.
        start: DateTime<Utc>,
        /// Requested end.
        end: DateTime<Utc>,
    },

    /// The requested sprint status change is not permitted.
    #[error("cannot move sprint {sprint_id} from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Sprint whose transition was rejected.
        sprint_id: SprintId,
        /// Current status.
        from: SprintStatus,
        /// Requested status.
        to: SprintStatus,
        /// Why the transition was rejected.
        reason: TransitionRejection,
    },

    /// A board mutation was attempted while the sprint is not active.
    #[error("board for sprint {sprint_id} is locked while the sprint is {status}")]
    BoardLocked {
        /// Sprint owning the board.
        sprint_id: SprintId,
        /// Status that locks the board.
        status: SprintStatus,
    },

    /// The move descriptor does not describe a valid drag on this board.
    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveError),

    /// The column layout is unusable.
    #[error("invalid board columns: {0}")]
    InvalidColumns(String),

    /// The sprint does not belong to the project named in the request.
    #[error("sprint {sprint_id} does not belong to project {project_id}")]
    SprintProjectMismatch {
        /// Sprint named in the request.
        sprint_id: SprintId,
        /// Project named in the request.
        project_id: ProjectId,
    },

    /// A local move was attempted while an earlier change set is still
    /// awaiting its commit result.
    #[error("local revision {revision} is still awaiting its commit")]
    CommitPending {
        /// Revision whose commit is outstanding.
        revision: u64,
    },

    /// A commit failed and the local board must be re-fetched before any
    /// further move.
    #[error("local revision {revision} failed to commit; re-fetch the board")]
    BoardOutOfSync {
        /// Revision whose commit failed.
        revision: u64,
    },
}

/// Reason attached to [`BoardDomainError::InvalidTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The sprint cannot start outside its `[start, end]` window.
    OutsideDateRange,
    /// Only an active sprint can be completed.
    NotActive,
    /// The pair of statuses is never a valid transition.
    Unsupported,
    /// Another caller changed the sprint status after it was read.
    StatusChanged,
}

impl std::fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::OutsideDateRange => "outside date range",
            Self::NotActive => "sprint is not active",
            Self::Unsupported => "transition not supported",
            Self::StatusChanged => "sprint status changed concurrently",
        };
        f.write_str(text)
    }
}

/// Problems with a move descriptor detected before reordering.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveError {
    /// The column key is not part of the status enumeration.
    #[error("unknown column key '{0}'")]
    UnknownColumn(String),

    /// The column exists but is not displayed on this board.
    #[error("column {0} is not on this board")]
    ColumnNotOnBoard(IssueStatus),

    /// No issue sits at the source position.
    #[error("no issue at index {index} of column {status} (length {len})")]
    SourceOutOfRange {
        /// Source column.
        status: IssueStatus,
        /// Requested index.
        index: usize,
        /// Column length.
        len: usize,
    },
}

/// Error returned while parsing an enumerated value from storage or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Human-readable name of the enumeration.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
