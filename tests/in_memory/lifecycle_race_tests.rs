//! Sprint transitions racing against a caller that already moved on.

use crate::in_memory::helpers::{clock, project, runtime, sprints};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;
use sprintboard::board::{
    adapters::memory::{FixedClock, InMemorySprintRepository, StaticAuthenticator},
    domain::{
        ActorId, BoardDomainError, Project, ProjectId, Sprint, SprintId, SprintStatus,
        SprintWithProject, TransitionRejection,
    },
    ports::{Actor, BoardRepositoryResult, SprintRepository},
    services::{BoardServiceError, CreateSprintRequest, ErrorKind, SprintLifecycleService},
};
use std::io;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Serves a sprint snapshot captured earlier while writing through to the
/// shared store.
struct FrozenReads {
    store: InMemorySprintRepository,
    snapshot: SprintWithProject,
}

#[async_trait]
impl SprintRepository for FrozenReads {
    async fn store(&self, sprint: &Sprint) -> BoardRepositoryResult<()> {
        self.store.store(sprint).await
    }

    async fn find_with_project(
        &self,
        id: SprintId,
    ) -> BoardRepositoryResult<Option<SprintWithProject>> {
        Ok((self.snapshot.sprint.id() == id).then(|| self.snapshot.clone()))
    }

    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>> {
        self.store.find_project(id).await
    }

    async fn persist_status(
        &self,
        id: SprintId,
        from: SprintStatus,
        to: SprintStatus,
        updated_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<Sprint> {
        self.store.persist_status(id, from, to, updated_at).await
    }
}

#[rstest]
fn start_from_stale_snapshot_cannot_reopen_completed_sprint(
    runtime: io::Result<Runtime>,
    sprints: InMemorySprintRepository,
    project: Project,
    clock: FixedClock,
) {
    let rt = runtime.expect("runtime creation");
    sprints
        .insert_project(project.clone())
        .expect("project insert");
    let clock = Arc::new(clock);
    let identity = Arc::new(StaticAuthenticator::signed_in(Actor::new(
        ActorId::new("user-lead"),
        project.organization_id().clone(),
    )));
    let current = SprintLifecycleService::new(
        Arc::new(sprints.clone()),
        Arc::clone(&identity),
        Arc::clone(&clock),
    );

    let planned = rt
        .block_on(current.create_sprint(CreateSprintRequest::new(
            project.id(),
            "Sprint 9",
            Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0)
                .single()
                .expect("valid start"),
            Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0)
                .single()
                .expect("valid end"),
        )))
        .expect("create sprint");
    let snapshot = rt
        .block_on(sprints.find_with_project(planned.id()))
        .expect("lookup")
        .expect("sprint present");
    let stale = SprintLifecycleService::new(
        Arc::new(FrozenReads {
            store: sprints.clone(),
            snapshot,
        }),
        identity,
        clock,
    );

    rt.block_on(current.start_sprint(planned.id()))
        .expect("start sprint");
    rt.block_on(current.complete_sprint(planned.id()))
        .expect("complete sprint");

    let err = rt
        .block_on(stale.start_sprint(planned.id()))
        .expect_err("stale start must be refused");

    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(matches!(
        err,
        BoardServiceError::Domain(BoardDomainError::InvalidTransition {
            from: SprintStatus::Completed,
            to: SprintStatus::Active,
            reason: TransitionRejection::StatusChanged,
            ..
        })
    ));
    let stored = rt
        .block_on(current.find_sprint(planned.id()))
        .expect("sprint still visible");
    assert_eq!(stored.status(), SprintStatus::Completed);
}
