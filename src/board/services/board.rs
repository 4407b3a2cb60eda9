//! Board orchestration: fetching, moving, committing, and issue upkeep.

use super::error::{BoardServiceError, BoardServiceResult};
use crate::board::{
    domain::{
        ActorId, Board, BoardColumns, BoardDomainError, ChangeSet, Issue, IssueDraft, IssueId,
        IssueMove, IssuePriority, IssueStatus, MoveOutcome, ProjectId, SprintId,
        SprintStatus, SprintWithProject, compact_after_removal, next_rank,
    },
    ports::{Actor, Authenticator, BoardRepositoryError, IssueRepository, SprintRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request payload for creating an issue on a sprint board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIssueRequest {
    project_id: ProjectId,
    sprint_id: SprintId,
    title: String,
    description: Option<String>,
    status: IssueStatus,
    priority: IssuePriority,
    assignee: Option<ActorId>,
}

impl CreateIssueRequest {
    /// Creates a request with the required fields. The issue lands in the
    /// `TODO` column with medium priority unless overridden.
    #[must_use]
    pub fn new(project_id: ProjectId, sprint_id: SprintId, title: impl Into<String>) -> Self {
        Self {
            project_id,
            sprint_id,
            title: title.into(),
            description: None,
            status: IssueStatus::Todo,
            priority: IssuePriority::Medium,
            assignee: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the target column.
    #[must_use]
    pub const fn with_status(mut self, status: IssueStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: ActorId) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

/// How an update should treat the assignee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssigneeChange {
    /// Leave the assignee as it is.
    #[default]
    Keep,
    /// Assign the issue to this actor.
    Assign(ActorId),
    /// Remove the assignee.
    Unassign,
}

/// Request payload for editing issue details.
///
/// Status is deliberately absent: column changes go through
/// [`BoardService::move_issue`] so ranks stay dense.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateIssueRequest {
    priority: Option<IssuePriority>,
    assignee: AssigneeChange,
}

impl UpdateIssueRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Changes the assignee.
    #[must_use]
    pub fn with_assignee(mut self, change: AssigneeChange) -> Self {
        self.assignee = change;
        self
    }

    /// Returns whether the request changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.assignee == AssigneeChange::Keep
    }
}

/// Sprint board orchestration service.
#[derive(Clone)]
pub struct BoardService<I, S, A, C>
where
    I: IssueRepository,
    S: SprintRepository,
    A: Authenticator,
    C: Clock + Send + Sync,
{
    issues: Arc<I>,
    sprints: Arc<S>,
    authenticator: Arc<A>,
    clock: Arc<C>,
    columns: BoardColumns,
}

impl<I, S, A, C> BoardService<I, S, A, C>
where
    I: IssueRepository,
    S: SprintRepository,
    A: Authenticator,
    C: Clock + Send + Sync,
{
    /// Creates a board service using the default column layout.
    #[must_use]
    pub fn new(issues: Arc<I>, sprints: Arc<S>, authenticator: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            issues,
            sprints,
            authenticator,
            clock,
            columns: BoardColumns::default(),
        }
    }

    /// Replaces the column layout used to materialize boards.
    #[must_use]
    pub fn with_columns(mut self, columns: BoardColumns) -> Self {
        self.columns = columns;
        self
    }

    /// Returns the column layout in use.
    #[must_use]
    pub const fn columns(&self) -> &BoardColumns {
        &self.columns
    }

    /// Fetches every issue of a sprint and materializes its board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Unauthorized`] without an identity,
    /// [`BoardServiceError::SprintNotFound`] when the sprint is missing or
    /// owned by another organization, and repository failures otherwise.
    pub async fn get_board(&self, sprint_id: SprintId) -> BoardServiceResult<Board> {
        let actor = self.authenticator.authenticate().await?;
        let resolved = self.resolve_sprint(&actor, sprint_id).await?;
        let issues = self.issues.find_by_sprint(sprint_id).await?;
        let board = Board::materialize(&resolved.sprint, issues, &self.columns);
        debug!(
            %sprint_id,
            issues = board.issue_count(),
            status = %board.sprint_status(),
            "materialized board"
        );
        Ok(board)
    }

    /// Computes the board that results from `issue_move` together with the
    /// placements to commit. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] when the board is locked or the
    /// move is invalid.
    #[expect(
        clippy::unused_self,
        reason = "moves belong to the board service surface alongside commits"
    )]
    pub fn move_issue(
        &self,
        board: &Board,
        issue_move: &IssueMove,
    ) -> BoardServiceResult<MoveOutcome> {
        Ok(board.apply_move(issue_move)?)
    }

    /// Like [`Self::move_issue`], taking raw column keys as delivered by a
    /// drag-and-drop surface.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] for unknown column keys, a
    /// locked board, or an invalid move.
    pub fn move_issue_by_key(
        &self,
        board: &Board,
        source_status: &str,
        source_index: usize,
        destination_status: &str,
        destination_index: usize,
    ) -> BoardServiceResult<MoveOutcome> {
        let issue_move = IssueMove::parse(
            source_status,
            source_index,
            destination_status,
            destination_index,
        )
        .map_err(BoardDomainError::from)?;
        self.move_issue(board, &issue_move)
    }

    /// Persists a change set atomically.
    ///
    /// An empty change set succeeds without touching storage.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] with
    /// [`BoardDomainError::BoardLocked`] unless the sprint is active,
    /// [`BoardServiceError::Conflict`] when a row changed since it was read,
    /// and [`BoardServiceError::PersistenceFailed`] for any other storage
    /// failure. Nothing is written on error.
    pub async fn commit_changes(&self, changes: &ChangeSet) -> BoardServiceResult<()> {
        let sprint_id = changes.sprint_id();
        let actor = self.authenticator.authenticate().await?;
        let resolved = self.resolve_sprint(&actor, sprint_id).await?;
        if let Err(err) = resolved.sprint.ensure_board_unlocked() {
            warn!(
                %sprint_id,
                status = %resolved.sprint.status(),
                "rejected commit on locked board"
            );
            return Err(err.into());
        }

        if changes.is_empty() {
            debug!(%sprint_id, "skipping empty change set");
            return Ok(());
        }

        self.issues
            .persist_batch(changes, self.clock.utc())
            .await
            .map_err(|err| {
                warn!(%sprint_id, rows = changes.len(), error = %err, "board commit failed");
                commit_error(err)
            })?;

        info!(
            %sprint_id,
            rows = changes.len(),
            revision = changes.revision(),
            actor = %actor.actor_id,
            "committed board changes"
        );
        Ok(())
    }

    /// Creates an issue at the bottom of its column.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::ProjectNotFound`] or
    /// [`BoardServiceError::SprintNotFound`] when either is missing, foreign,
    /// or the sprint belongs to a different project. A blank title or a
    /// completed sprint yields [`BoardServiceError::Domain`].
    pub async fn create_issue(&self, request: CreateIssueRequest) -> BoardServiceResult<Issue> {
        let actor = self.authenticator.authenticate().await?;
        let resolved = self.resolve_sprint(&actor, request.sprint_id).await?;
        if resolved.project.id() != request.project_id {
            return Err(BoardDomainError::SprintProjectMismatch {
                sprint_id: request.sprint_id,
                project_id: request.project_id,
            }
            .into());
        }
        if resolved.sprint.status() == SprintStatus::Completed {
            return Err(BoardDomainError::BoardLocked {
                sprint_id: request.sprint_id,
                status: SprintStatus::Completed,
            }
            .into());
        }

        let mut draft = IssueDraft::new(
            request.title,
            request.sprint_id,
            request.project_id,
            actor.actor_id,
        )?
        .with_status(request.status)
        .with_priority(request.priority);
        if let Some(description) = request.description {
            draft = draft.with_description(description);
        }
        if let Some(assignee) = request.assignee {
            draft = draft.with_assignee(assignee);
        }

        let existing = self.issues.find_by_sprint(request.sprint_id).await?;
        let rank = next_rank(&existing, draft.status());
        let issue = Issue::new(draft, rank, &*self.clock);
        self.issues.store(&issue).await?;
        info!(
            issue_id = %issue.id(),
            sprint_id = %issue.sprint_id(),
            status = %issue.status(),
            rank,
            "created issue"
        );
        Ok(issue)
    }

    /// Edits the priority or assignee of an issue.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::IssueNotFound`] when the issue is missing
    /// or foreign and [`BoardServiceError::Conflict`] when it changed
    /// concurrently.
    pub async fn update_issue(
        &self,
        issue_id: IssueId,
        request: UpdateIssueRequest,
    ) -> BoardServiceResult<Issue> {
        let actor = self.authenticator.authenticate().await?;
        let (mut issue, _) = self.resolve_issue(&actor, issue_id).await?;
        if request.is_empty() {
            return Ok(issue);
        }

        if let Some(priority) = request.priority {
            issue.set_priority(priority, &*self.clock);
        }
        match request.assignee {
            AssigneeChange::Keep => {}
            AssigneeChange::Assign(assignee) => issue.set_assignee(Some(assignee), &*self.clock),
            AssigneeChange::Unassign => issue.set_assignee(None, &*self.clock),
        }

        let stored = self.issues.update_details(&issue).await?;
        info!(%issue_id, version = stored.version(), "updated issue details");
        Ok(stored)
    }

    /// Deletes an issue and closes the gap it leaves in its column.
    ///
    /// Only the reporter or a project administrator may delete.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::IssueNotFound`] when the issue is missing
    /// or foreign, [`BoardServiceError::Forbidden`] for other actors, and
    /// [`BoardServiceError::Conflict`] or
    /// [`BoardServiceError::PersistenceFailed`] when the atomic write fails.
    pub async fn delete_issue(&self, issue_id: IssueId) -> BoardServiceResult<()> {
        let actor = self.authenticator.authenticate().await?;
        let (issue, resolved) = self.resolve_issue(&actor, issue_id).await?;
        if issue.reporter() != &actor.actor_id && !resolved.project.is_admin(&actor.actor_id) {
            warn!(%issue_id, actor = %actor.actor_id, "rejected issue deletion");
            return Err(BoardServiceError::Forbidden {
                actor_id: actor.actor_id,
                issue_id,
            });
        }

        let siblings = self.issues.find_by_sprint(issue.sprint_id()).await?;
        let compaction = compact_after_removal(&siblings, &issue);
        self.issues
            .delete(&issue, &compaction, self.clock.utc())
            .await
            .map_err(commit_error)?;
        info!(
            %issue_id,
            sprint_id = %issue.sprint_id(),
            renumbered = compaction.len(),
            "deleted issue"
        );
        Ok(())
    }

    async fn resolve_sprint(
        &self,
        actor: &Actor,
        sprint_id: SprintId,
    ) -> BoardServiceResult<SprintWithProject> {
        let resolved = self
            .sprints
            .find_with_project(sprint_id)
            .await?
            .ok_or(BoardServiceError::SprintNotFound(sprint_id))?;
        if !resolved.project.belongs_to(&actor.organization_id) {
            debug!(
                %sprint_id,
                organization = %actor.organization_id,
                "sprint outside organization"
            );
            return Err(BoardServiceError::SprintNotFound(sprint_id));
        }
        Ok(resolved)
    }

    async fn resolve_issue(
        &self,
        actor: &Actor,
        issue_id: IssueId,
    ) -> BoardServiceResult<(Issue, SprintWithProject)> {
        let issue = self
            .issues
            .find_by_id(issue_id)
            .await?
            .ok_or(BoardServiceError::IssueNotFound(issue_id))?;
        let resolved = self
            .resolve_sprint(actor, issue.sprint_id())
            .await
            .map_err(|err| match err {
                BoardServiceError::SprintNotFound(_) => BoardServiceError::IssueNotFound(issue_id),
                other => other,
            })?;
        Ok((issue, resolved))
    }
}

/// Maps a failed atomic write onto the service error surface.
fn commit_error(err: BoardRepositoryError) -> BoardServiceError {
    match err {
        BoardRepositoryError::VersionConflict {
            issue_id,
            expected,
            actual,
        } => BoardServiceError::Conflict {
            issue_id,
            expected,
            actual,
        },
        BoardRepositoryError::SprintNotActive { sprint_id, status } => {
            BoardServiceError::Domain(BoardDomainError::BoardLocked { sprint_id, status })
        }
        other => BoardServiceError::PersistenceFailed(other),
    }
}
