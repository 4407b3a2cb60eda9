//! Service-boundary errors for sprint board operations.

use crate::board::{
    domain::{ActorId, BoardDomainError, IssueId, ProjectId, SprintId, TransitionRejection},
    ports::{AuthError, BoardRepositoryError},
};
use std::fmt;
use thiserror::Error;

/// Coarse category of a [`BoardServiceError`], for callers that only need
/// to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No usable identity.
    Unauthorized,
    /// The actor may not perform the operation.
    Forbidden,
    /// The sprint, issue, or project does not exist for this actor.
    NotFound,
    /// Input failed validation.
    InvalidInput,
    /// The sprint lifecycle rejected a transition.
    InvalidTransition,
    /// The sprint board does not accept mutations.
    BoardLocked,
    /// Storage moved on since the caller last read it.
    Conflict,
    /// Storage failed; nothing was written.
    PersistenceFailed,
}

impl ErrorKind {
    /// Returns a stable identifier for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::InvalidTransition => "invalid_transition",
            Self::BoardLocked => "board_locked",
            Self::Conflict => "conflict",
            Self::PersistenceFailed => "persistence_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by board services.
#[derive(Debug, Error)]
pub enum BoardServiceError {
    /// The caller could not be identified.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// The caller is identified but lacks the required role.
    #[error("{actor_id} may not modify issue {issue_id}")]
    Forbidden {
        /// Acting user.
        actor_id: ActorId,
        /// Issue the actor tried to modify.
        issue_id: IssueId,
    },

    /// The sprint does not exist or is not visible to the caller.
    #[error("sprint not found: {0}")]
    SprintNotFound(SprintId),

    /// The issue does not exist or is not visible to the caller.
    #[error("issue not found: {0}")]
    IssueNotFound(IssueId),

    /// The project does not exist or is not visible to the caller.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Domain validation or lifecycle rules rejected the request.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// An issue changed in storage after the caller read it.
    #[error("issue {issue_id} changed concurrently (expected version {expected}, found {actual})")]
    Conflict {
        /// Conflicting issue.
        issue_id: IssueId,
        /// Version the caller held.
        expected: u64,
        /// Version found in storage.
        actual: u64,
    },

    /// Storage failed; nothing was written.
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[source] BoardRepositoryError),
}

impl BoardServiceError {
    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::SprintNotFound(_) | Self::IssueNotFound(_) | Self::ProjectNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Domain(BoardDomainError::InvalidTransition { .. }) => {
                ErrorKind::InvalidTransition
            }
            Self::Domain(BoardDomainError::BoardLocked { .. }) => ErrorKind::BoardLocked,
            Self::Domain(_) => ErrorKind::InvalidInput,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
        }
    }
}

impl From<BoardRepositoryError> for BoardServiceError {
    fn from(err: BoardRepositoryError) -> Self {
        match err {
            BoardRepositoryError::IssueNotFound(issue_id) => Self::IssueNotFound(issue_id),
            BoardRepositoryError::SprintNotFound(sprint_id) => Self::SprintNotFound(sprint_id),
            BoardRepositoryError::VersionConflict {
                issue_id,
                expected,
                actual,
            } => Self::Conflict {
                issue_id,
                expected,
                actual,
            },
            BoardRepositoryError::StaleStatus {
                sprint_id,
                actual,
                target,
                ..
            } => Self::Domain(BoardDomainError::InvalidTransition {
                sprint_id,
                from: actual,
                to: target,
                reason: TransitionRejection::StatusChanged,
            }),
            BoardRepositoryError::SprintNotActive { sprint_id, status } => {
                Self::Domain(BoardDomainError::BoardLocked { sprint_id, status })
            }
            other => Self::PersistenceFailed(other),
        }
    }
}

/// Result type for board service operations.
pub type BoardServiceResult<T> = Result<T, BoardServiceError>;
