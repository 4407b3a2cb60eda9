//! Repository ports for issue and sprint persistence.

use crate::board::domain::{
    ChangeSet, Issue, IssueId, Project, ProjectId, RankChange, Sprint, SprintId, SprintStatus,
    SprintWithProject,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for board repository operations.
pub type BoardRepositoryResult<T> = Result<T, BoardRepositoryError>;

/// Issue persistence contract.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Stores a new issue.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateIssue`] when the identifier
    /// already exists.
    async fn store(&self, issue: &Issue) -> BoardRepositoryResult<()>;

    /// Finds an issue by identifier.
    ///
    /// Returns `None` when the issue does not exist.
    async fn find_by_id(&self, id: IssueId) -> BoardRepositoryResult<Option<Issue>>;

    /// Returns every issue scheduled in a sprint, in no particular order.
    async fn find_by_sprint(&self, sprint_id: SprintId) -> BoardRepositoryResult<Vec<Issue>>;

    /// Persists edited issue details (priority, assignee) when the stored
    /// version still matches `issue.version()`, returning the stored issue
    /// with its bumped version.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::IssueNotFound`] or
    /// [`BoardRepositoryError::VersionConflict`].
    async fn update_details(&self, issue: &Issue) -> BoardRepositoryResult<Issue>;

    /// Applies every placement of `changes` as one atomic unit.
    ///
    /// Each row is updated only when its stored version equals the change's
    /// expected version; the version is then incremented. Any failure rolls
    /// back the whole batch so no partial application is observable.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::IssueNotFound`],
    /// [`BoardRepositoryError::SprintMismatch`],
    /// [`BoardRepositoryError::VersionConflict`],
    /// [`BoardRepositoryError::SprintNotActive`] (adapters that can see the
    /// sprint row check it inside the same unit), or
    /// [`BoardRepositoryError::Persistence`]. In every case nothing was
    /// written.
    async fn persist_batch(
        &self,
        changes: &ChangeSet,
        committed_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<()>;

    /// Deletes `issue` and applies `compaction` to the survivors of its
    /// column in the same atomic unit.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::IssueNotFound`] or
    /// [`BoardRepositoryError::VersionConflict`]; nothing is written.
    async fn delete(
        &self,
        issue: &Issue,
        compaction: &[RankChange],
        committed_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<()>;
}

/// Sprint persistence contract, including the project lookup sprints need.
#[async_trait]
pub trait SprintRepository: Send + Sync {
    /// Stores a new sprint.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::DuplicateSprint`] when the identifier
    /// already exists.
    async fn store(&self, sprint: &Sprint) -> BoardRepositoryResult<()>;

    /// Finds a sprint together with its owning project.
    ///
    /// Returns `None` when the sprint does not exist.
    async fn find_with_project(
        &self,
        id: SprintId,
    ) -> BoardRepositoryResult<Option<SprintWithProject>>;

    /// Finds a project by identifier.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>>;

    /// Moves a sprint from `from` to `to` and returns the updated sprint.
    ///
    /// The write only happens while the stored status still equals `from`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::SprintNotFound`] when the sprint does
    /// not exist and [`BoardRepositoryError::StaleStatus`] when another
    /// caller changed its status first.
    async fn persist_status(
        &self,
        id: SprintId,
        from: SprintStatus,
        to: SprintStatus,
        updated_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<Sprint>;
}

/// Errors returned by board repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardRepositoryError {
    /// An issue with the same identifier already exists.
    #[error("duplicate issue identifier: {0}")]
    DuplicateIssue(IssueId),

    /// A sprint with the same identifier already exists.
    #[error("duplicate sprint identifier: {0}")]
    DuplicateSprint(SprintId),

    /// The issue was not found.
    #[error("issue not found: {0}")]
    IssueNotFound(IssueId),

    /// The sprint was not found.
    #[error("sprint not found: {0}")]
    SprintNotFound(SprintId),

    /// A change targets an issue scheduled in another sprint.
    #[error("issue {issue_id} is not part of sprint {sprint_id}")]
    SprintMismatch {
        /// Issue named by the change.
        issue_id: IssueId,
        /// Sprint the change set was produced for.
        sprint_id: SprintId,
    },

    /// The stored row changed since the caller read it.
    #[error("issue {issue_id} is at version {actual}, expected {expected}")]
    VersionConflict {
        /// Conflicting issue.
        issue_id: IssueId,
        /// Version the caller expected.
        expected: u64,
        /// Version found in storage.
        actual: u64,
    },

    /// The sprint status no longer matches the status the caller read.
    #[error("sprint {sprint_id} is {actual}, expected {expected} before moving to {target}")]
    StaleStatus {
        /// Sprint whose status moved on.
        sprint_id: SprintId,
        /// Status the caller read.
        expected: SprintStatus,
        /// Status found in storage.
        actual: SprintStatus,
        /// Status the caller asked for.
        target: SprintStatus,
    },

    /// Board rows were written for a sprint that is no longer active.
    #[error("sprint {sprint_id} is {status}; its board does not accept writes")]
    SprintNotActive {
        /// Sprint owning the board.
        sprint_id: SprintId,
        /// Status found in storage.
        status: SprintStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
