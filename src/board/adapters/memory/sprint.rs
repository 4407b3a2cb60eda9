//! In-memory sprint and project repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::board::{
    domain::{
        PersistedSprintData, Project, ProjectId, Sprint, SprintId, SprintStatus,
        SprintWithProject,
    },
    ports::{BoardRepositoryError, BoardRepositoryResult, SprintRepository},
};

/// Thread-safe in-memory sprint repository.
///
/// Projects are owned elsewhere; tests and demos seed them with
/// [`InMemorySprintRepository::insert_project`].
#[derive(Debug, Clone, Default)]
pub struct InMemorySprintRepository {
    state: Arc<RwLock<InMemorySprintState>>,
}

#[derive(Debug, Default)]
struct InMemorySprintState {
    sprints: HashMap<SprintId, Sprint>,
    projects: HashMap<ProjectId, Project>,
}

impl InMemorySprintRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::Persistence`] if the state lock is
    /// poisoned.
    pub fn insert_project(&self, project: Project) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        state.projects.insert(project.id(), project);
        Ok(())
    }

    fn read(&self) -> BoardRepositoryResult<RwLockReadGuard<'_, InMemorySprintState>> {
        self.state.read().map_err(|err| {
            BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> BoardRepositoryResult<RwLockWriteGuard<'_, InMemorySprintState>> {
        self.state.write().map_err(|err| {
            BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl SprintRepository for InMemorySprintRepository {
    async fn store(&self, sprint: &Sprint) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.sprints.contains_key(&sprint.id()) {
            return Err(BoardRepositoryError::DuplicateSprint(sprint.id()));
        }
        state.sprints.insert(sprint.id(), sprint.clone());
        Ok(())
    }

    async fn find_with_project(
        &self,
        id: SprintId,
    ) -> BoardRepositoryResult<Option<SprintWithProject>> {
        let state = self.read()?;
        let Some(sprint) = state.sprints.get(&id) else {
            return Ok(None);
        };
        Ok(state
            .projects
            .get(&sprint.project_id())
            .map(|project| SprintWithProject {
                sprint: sprint.clone(),
                project: project.clone(),
            }))
    }

    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>> {
        let state = self.read()?;
        Ok(state.projects.get(&id).cloned())
    }

    async fn persist_status(
        &self,
        id: SprintId,
        from: SprintStatus,
        to: SprintStatus,
        updated_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<Sprint> {
        let mut state = self.write()?;
        let stored = state
            .sprints
            .get_mut(&id)
            .ok_or(BoardRepositoryError::SprintNotFound(id))?;
        if stored.status() != from {
            return Err(BoardRepositoryError::StaleStatus {
                sprint_id: id,
                expected: from,
                actual: stored.status(),
                target: to,
            });
        }
        let updated = Sprint::from_persisted(PersistedSprintData {
            id: stored.id(),
            name: stored.name().to_owned(),
            start_date: stored.start_date(),
            end_date: stored.end_date(),
            status: to,
            project_id: stored.project_id(),
            created_at: stored.created_at(),
            updated_at,
        });
        *stored = updated.clone();
        Ok(updated)
    }
}
