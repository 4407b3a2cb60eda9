//! `PostgreSQL` repository implementation for sprint boards.
//!
//! Every multi-row write runs inside one transaction. Rank updates are
//! conditional on the row's stored version, and a row that fails to match
//! aborts the transaction so the batch either lands whole or not at all.

use super::{
    models::{IssueRow, ProjectRow, SprintRow},
    schema::{issues, projects, sprints},
};
use crate::board::{
    domain::{
        ActorId, ChangeSet, Issue, IssueId, IssuePriority, IssueStatus, OrganizationId,
        PersistedIssueData, PersistedSprintData, Project, ProjectId, RankChange, Sprint, SprintId,
        SprintStatus, SprintWithProject,
    },
    ports::{
        BoardRepositoryError, BoardRepositoryResult, IssueRepository, SprintRepository,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed issue and sprint repository.
#[derive(Debug, Clone)]
pub struct PostgresBoardRepository {
    pool: BoardPgPool,
}

impl From<DieselError> for BoardRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresBoardRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    /// Builds a connection pool for `database_url` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::Persistence`] when the pool cannot
    /// open its initial connections.
    pub fn connect(database_url: &str, max_pool_size: u32) -> BoardRepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(max_pool_size)
            .build(manager)
            .map_err(BoardRepositoryError::persistence)?;
        Ok(Self::new(pool))
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &BoardPgPool {
        &self.pool
    }

    /// Registers or replaces a project row.
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::Persistence`] when the write fails.
    pub async fn insert_project(&self, project: &Project) -> BoardRepositoryResult<()> {
        let row = project_to_row(project);
        self.run_blocking(move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .on_conflict(projects::id)
                .do_update()
                .set((
                    projects::key.eq(&row.key),
                    projects::name.eq(&row.name),
                    projects::organization_id.eq(&row.organization_id),
                    projects::admin_ids.eq(&row.admin_ids),
                ))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn run_blocking<F, T>(&self, f: F) -> BoardRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BoardRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BoardRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BoardRepositoryError::persistence)?
    }
}

#[async_trait]
impl IssueRepository for PostgresBoardRepository {
    async fn store(&self, issue: &Issue) -> BoardRepositoryResult<()> {
        let issue_id = issue.id();
        let row = issue_to_row(issue)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(issues::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateIssue(issue_id)
                    }
                    _ => BoardRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: IssueId) -> BoardRepositoryResult<Option<Issue>> {
        self.run_blocking(move |connection| {
            let row = issues::table
                .filter(issues::id.eq(id.into_inner()))
                .select(IssueRow::as_select())
                .first::<IssueRow>(connection)
                .optional()?;
            row.map(row_to_issue).transpose()
        })
        .await
    }

    async fn find_by_sprint(&self, sprint_id: SprintId) -> BoardRepositoryResult<Vec<Issue>> {
        self.run_blocking(move |connection| {
            let rows = issues::table
                .filter(issues::sprint_id.eq(sprint_id.into_inner()))
                .order((issues::status.asc(), issues::rank.asc(), issues::id.asc()))
                .select(IssueRow::as_select())
                .load::<IssueRow>(connection)?;
            rows.into_iter().map(row_to_issue).collect()
        })
        .await
    }

    async fn update_details(&self, issue: &Issue) -> BoardRepositoryResult<Issue> {
        let issue_id = issue.id();
        let expected = to_db_version(issue.version())?;
        let priority = issue.priority().as_str();
        let assignee = issue.assignee().map(|actor| actor.as_str().to_owned());
        let updated_at = issue.updated_at();

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                issues::table
                    .filter(issues::id.eq(issue_id.into_inner()))
                    .filter(issues::version.eq(expected)),
            )
            .set((
                issues::priority.eq(priority),
                issues::assignee.eq(assignee),
                issues::version.eq(issues::version + 1_i64),
                issues::updated_at.eq(updated_at),
            ))
            .returning(IssueRow::as_returning())
            .get_result::<IssueRow>(connection)
            .optional()?;

            match updated {
                Some(row) => row_to_issue(row),
                None => Err(explain_missed_write(connection, issue_id, expected, None)?),
            }
        })
        .await
    }

    async fn persist_batch(
        &self,
        changes: &ChangeSet,
        committed_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        let sprint_id = changes.sprint_id();
        let rows = changes.changes().to_vec();
        let row_count = rows.len();

        self.run_blocking(move |connection| {
            connection.transaction::<_, BoardRepositoryError, _>(|tx| {
                lock_active_sprint(tx, sprint_id)?;
                for change in &rows {
                    apply_rank_change(tx, sprint_id, change, committed_at)?;
                }
                Ok(())
            })
        })
        .await?;

        debug!(%sprint_id, rows = row_count, "committed board change set");
        Ok(())
    }

    async fn delete(
        &self,
        issue: &Issue,
        compaction: &[RankChange],
        committed_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        let issue_id = issue.id();
        let sprint_id = issue.sprint_id();
        let expected = to_db_version(issue.version())?;
        let rows = compaction.to_vec();

        self.run_blocking(move |connection| {
            connection.transaction::<_, BoardRepositoryError, _>(|tx| {
                lock_active_sprint(tx, sprint_id)?;
                let deleted = diesel::delete(
                    issues::table
                        .filter(issues::id.eq(issue_id.into_inner()))
                        .filter(issues::version.eq(expected)),
                )
                .execute(tx)?;
                if deleted == 0 {
                    return Err(explain_missed_write(tx, issue_id, expected, None)?);
                }
                for change in &rows {
                    apply_rank_change(tx, sprint_id, change, committed_at)?;
                }
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl SprintRepository for PostgresBoardRepository {
    async fn store(&self, sprint: &Sprint) -> BoardRepositoryResult<()> {
        let sprint_id = sprint.id();
        let row = sprint_to_row(sprint);
        self.run_blocking(move |connection| {
            diesel::insert_into(sprints::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateSprint(sprint_id)
                    }
                    _ => BoardRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_with_project(
        &self,
        id: SprintId,
    ) -> BoardRepositoryResult<Option<SprintWithProject>> {
        self.run_blocking(move |connection| {
            let row = sprints::table
                .inner_join(projects::table)
                .filter(sprints::id.eq(id.into_inner()))
                .select((SprintRow::as_select(), ProjectRow::as_select()))
                .first::<(SprintRow, ProjectRow)>(connection)
                .optional()?;
            row.map(|(sprint, project)| {
                Ok(SprintWithProject {
                    sprint: row_to_sprint(sprint)?,
                    project: row_to_project(project),
                })
            })
            .transpose()
        })
        .await
    }

    async fn find_project(&self, id: ProjectId) -> BoardRepositoryResult<Option<Project>> {
        self.run_blocking(move |connection| {
            let row = projects::table
                .filter(projects::id.eq(id.into_inner()))
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()?;
            Ok(row.map(row_to_project))
        })
        .await
    }

    async fn persist_status(
        &self,
        id: SprintId,
        from: SprintStatus,
        to: SprintStatus,
        updated_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<Sprint> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                sprints::table
                    .filter(sprints::id.eq(id.into_inner()))
                    .filter(sprints::status.eq(from.as_str())),
            )
            .set((
                sprints::status.eq(to.as_str()),
                sprints::updated_at.eq(updated_at),
            ))
            .returning(SprintRow::as_returning())
            .get_result::<SprintRow>(connection)
            .optional()?;

            match updated {
                Some(row) => row_to_sprint(row),
                None => match stored_sprint_status(connection, id)? {
                    None => Err(BoardRepositoryError::SprintNotFound(id)),
                    Some(actual) => Err(BoardRepositoryError::StaleStatus {
                        sprint_id: id,
                        expected: from,
                        actual,
                        target: to,
                    }),
                },
            }
        })
        .await
    }
}

/// Share-locks the sprint row for the rest of the transaction and fails
/// unless the sprint is active. A concurrent completion blocks until the
/// board write commits.
fn lock_active_sprint(
    connection: &mut PgConnection,
    sprint_id: SprintId,
) -> BoardRepositoryResult<()> {
    let status = sprints::table
        .filter(sprints::id.eq(sprint_id.into_inner()))
        .select(sprints::status)
        .for_share()
        .first::<String>(connection)
        .optional()?
        .ok_or(BoardRepositoryError::SprintNotFound(sprint_id))?;
    let status =
        SprintStatus::try_from(status.as_str()).map_err(BoardRepositoryError::persistence)?;
    if status == SprintStatus::Active {
        Ok(())
    } else {
        Err(BoardRepositoryError::SprintNotActive { sprint_id, status })
    }
}

fn stored_sprint_status(
    connection: &mut PgConnection,
    sprint_id: SprintId,
) -> BoardRepositoryResult<Option<SprintStatus>> {
    let status = sprints::table
        .filter(sprints::id.eq(sprint_id.into_inner()))
        .select(sprints::status)
        .first::<String>(connection)
        .optional()?;
    status
        .map(|value| {
            SprintStatus::try_from(value.as_str()).map_err(BoardRepositoryError::persistence)
        })
        .transpose()
}

/// Writes one placement, failing the surrounding transaction when the row
/// is missing, belongs elsewhere, or has moved on.
fn apply_rank_change(
    connection: &mut PgConnection,
    sprint_id: SprintId,
    change: &RankChange,
    committed_at: DateTime<Utc>,
) -> BoardRepositoryResult<()> {
    let rank = i32::try_from(change.rank).map_err(BoardRepositoryError::persistence)?;
    let expected = to_db_version(change.expected_version)?;
    let updated = diesel::update(
        issues::table
            .filter(issues::id.eq(change.issue_id.into_inner()))
            .filter(issues::sprint_id.eq(sprint_id.into_inner()))
            .filter(issues::version.eq(expected)),
    )
    .set((
        issues::status.eq(change.status.as_str()),
        issues::rank.eq(rank),
        issues::version.eq(issues::version + 1_i64),
        issues::updated_at.eq(committed_at),
    ))
    .execute(connection)?;

    if updated == 0 {
        return Err(explain_missed_write(
            connection,
            change.issue_id,
            expected,
            Some(sprint_id),
        )?);
    }
    Ok(())
}

/// Works out why a conditional write matched no row.
fn explain_missed_write(
    connection: &mut PgConnection,
    issue_id: IssueId,
    expected: i64,
    sprint_id: Option<SprintId>,
) -> BoardRepositoryResult<BoardRepositoryError> {
    let stored = issues::table
        .filter(issues::id.eq(issue_id.into_inner()))
        .select((issues::sprint_id, issues::version))
        .first::<(uuid::Uuid, i64)>(connection)
        .optional()?;

    let Some((stored_sprint, stored_version)) = stored else {
        return Ok(BoardRepositoryError::IssueNotFound(issue_id));
    };
    if let Some(sprint) = sprint_id.filter(|sprint| sprint.into_inner() != stored_sprint) {
        return Ok(BoardRepositoryError::SprintMismatch {
            issue_id,
            sprint_id: sprint,
        });
    }
    Ok(BoardRepositoryError::VersionConflict {
        issue_id,
        expected: from_db_version(expected)?,
        actual: from_db_version(stored_version)?,
    })
}

fn to_db_version(version: u64) -> BoardRepositoryResult<i64> {
    i64::try_from(version).map_err(BoardRepositoryError::persistence)
}

fn from_db_version(version: i64) -> BoardRepositoryResult<u64> {
    u64::try_from(version).map_err(BoardRepositoryError::persistence)
}

fn issue_to_row(issue: &Issue) -> BoardRepositoryResult<IssueRow> {
    Ok(IssueRow {
        id: issue.id().into_inner(),
        title: issue.title().to_owned(),
        description: issue.description().map(str::to_owned),
        status: issue.status().as_str().to_owned(),
        priority: issue.priority().as_str().to_owned(),
        rank: i32::try_from(issue.rank()).map_err(BoardRepositoryError::persistence)?,
        version: to_db_version(issue.version())?,
        sprint_id: issue.sprint_id().into_inner(),
        project_id: issue.project_id().into_inner(),
        assignee: issue.assignee().map(|actor| actor.as_str().to_owned()),
        reporter: issue.reporter().as_str().to_owned(),
        created_at: issue.created_at(),
        updated_at: issue.updated_at(),
    })
}

fn row_to_issue(row: IssueRow) -> BoardRepositoryResult<Issue> {
    let status =
        IssueStatus::try_from(row.status.as_str()).map_err(BoardRepositoryError::persistence)?;
    let priority = IssuePriority::try_from(row.priority.as_str())
        .map_err(BoardRepositoryError::persistence)?;
    let data = PersistedIssueData {
        id: IssueId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        status,
        priority,
        rank: u32::try_from(row.rank).map_err(BoardRepositoryError::persistence)?,
        version: from_db_version(row.version)?,
        sprint_id: SprintId::from_uuid(row.sprint_id),
        project_id: ProjectId::from_uuid(row.project_id),
        assignee: row.assignee.map(ActorId::new),
        reporter: ActorId::new(row.reporter),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Issue::from_persisted(data))
}

fn sprint_to_row(sprint: &Sprint) -> SprintRow {
    SprintRow {
        id: sprint.id().into_inner(),
        name: sprint.name().to_owned(),
        start_date: sprint.start_date(),
        end_date: sprint.end_date(),
        status: sprint.status().as_str().to_owned(),
        project_id: sprint.project_id().into_inner(),
        created_at: sprint.created_at(),
        updated_at: sprint.updated_at(),
    }
}

fn row_to_sprint(row: SprintRow) -> BoardRepositoryResult<Sprint> {
    let status =
        SprintStatus::try_from(row.status.as_str()).map_err(BoardRepositoryError::persistence)?;
    Ok(Sprint::from_persisted(PersistedSprintData {
        id: SprintId::from_uuid(row.id),
        name: row.name,
        start_date: row.start_date,
        end_date: row.end_date,
        status,
        project_id: ProjectId::from_uuid(row.project_id),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn project_to_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id().into_inner(),
        key: project.key().to_owned(),
        name: project.name().to_owned(),
        organization_id: project.organization_id().as_str().to_owned(),
        admin_ids: project
            .admin_ids()
            .iter()
            .map(|actor| actor.as_str().to_owned())
            .collect(),
    }
}

fn row_to_project(row: ProjectRow) -> Project {
    Project::new(
        ProjectId::from_uuid(row.id),
        row.key,
        row.name,
        OrganizationId::new(row.organization_id),
    )
    .with_admins(row.admin_ids.into_iter().map(ActorId::new))
}
