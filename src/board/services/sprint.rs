//! Sprint creation and lifecycle transitions.

use super::error::{BoardServiceError, BoardServiceResult};
use crate::board::{
    domain::{ProjectId, Sprint, SprintId, SprintStatus, SprintWithProject},
    ports::{Actor, Authenticator, SprintRepository},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};

/// Request payload for creating a sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSprintRequest {
    project_id: ProjectId,
    name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl CreateSprintRequest {
    /// Creates a request for a sprint running from `start_date` to
    /// `end_date`, both inclusive.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            name: name.into(),
            start_date,
            end_date,
        }
    }
}

/// Sprint lifecycle orchestration service.
#[derive(Clone)]
pub struct SprintLifecycleService<S, A, C>
where
    S: SprintRepository,
    A: Authenticator,
    C: Clock + Send + Sync,
{
    sprints: Arc<S>,
    authenticator: Arc<A>,
    clock: Arc<C>,
}

impl<S, A, C> SprintLifecycleService<S, A, C>
where
    S: SprintRepository,
    A: Authenticator,
    C: Clock + Send + Sync,
{
    /// Creates a new sprint lifecycle service.
    #[must_use]
    pub const fn new(sprints: Arc<S>, authenticator: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            sprints,
            authenticator,
            clock,
        }
    }

    /// Creates a planned sprint in a project of the caller's organization.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::ProjectNotFound`] when the project is
    /// missing or foreign, and [`BoardServiceError::Domain`] for a blank
    /// name or an inverted date range.
    pub async fn create_sprint(&self, request: CreateSprintRequest) -> BoardServiceResult<Sprint> {
        let actor = self.authenticator.authenticate().await?;
        let project = self
            .sprints
            .find_project(request.project_id)
            .await?
            .filter(|project| project.belongs_to(&actor.organization_id))
            .ok_or(BoardServiceError::ProjectNotFound(request.project_id))?;

        let sprint = Sprint::new(
            request.name,
            request.start_date,
            request.end_date,
            project.id(),
            &*self.clock,
        )?;
        self.sprints.store(&sprint).await?;
        info!(
            sprint_id = %sprint.id(),
            project = project.key(),
            "created sprint"
        );
        Ok(sprint)
    }

    /// Starts a planned sprint whose date window contains the current time.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] with an invalid transition when
    /// the sprint is not planned or the clock lies outside its window.
    pub async fn start_sprint(&self, sprint_id: SprintId) -> BoardServiceResult<Sprint> {
        self.transition(sprint_id, SprintStatus::Active).await
    }

    /// Completes an active sprint, locking its board for good.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] with an invalid transition when
    /// the sprint is not active.
    pub async fn complete_sprint(&self, sprint_id: SprintId) -> BoardServiceResult<Sprint> {
        self.transition(sprint_id, SprintStatus::Completed).await
    }

    /// Returns a sprint visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::SprintNotFound`] when the sprint is
    /// missing or foreign.
    pub async fn find_sprint(&self, sprint_id: SprintId) -> BoardServiceResult<Sprint> {
        let actor = self.authenticator.authenticate().await?;
        Ok(self.resolve(&actor, sprint_id).await?.sprint)
    }

    async fn transition(
        &self,
        sprint_id: SprintId,
        target: SprintStatus,
    ) -> BoardServiceResult<Sprint> {
        let actor = self.authenticator.authenticate().await?;
        let resolved = self.resolve(&actor, sprint_id).await?;
        let now = self.clock.utc();
        if let Err(err) = resolved.sprint.check_transition(target, now) {
            warn!(
                %sprint_id,
                from = %resolved.sprint.status(),
                to = %target,
                error = %err,
                "rejected sprint transition"
            );
            return Err(err.into());
        }

        let from = resolved.sprint.status();
        let updated = match self
            .sprints
            .persist_status(sprint_id, from, target, now)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                warn!(
                    %sprint_id,
                    %from,
                    to = %target,
                    error = %err,
                    "sprint transition not persisted"
                );
                return Err(err.into());
            }
        };
        info!(
            %sprint_id,
            %from,
            to = %updated.status(),
            actor = %actor.actor_id,
            "sprint transitioned"
        );
        Ok(updated)
    }

    async fn resolve(
        &self,
        actor: &Actor,
        sprint_id: SprintId,
    ) -> BoardServiceResult<SprintWithProject> {
        self.sprints
            .find_with_project(sprint_id)
            .await?
            .filter(|resolved| resolved.project.belongs_to(&actor.organization_id))
            .ok_or(BoardServiceError::SprintNotFound(sprint_id))
    }
}
