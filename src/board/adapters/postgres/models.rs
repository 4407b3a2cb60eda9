//! Diesel row models for sprint board persistence.

use super::schema::{issues, projects, sprints};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for project records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Short project key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Owning organization.
    pub organization_id: String,
    /// Project administrators.
    pub admin_ids: Vec<String>,
}

/// Row model for sprint records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sprints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SprintRow {
    /// Sprint identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Start of the sprint window.
    pub start_date: DateTime<Utc>,
    /// End of the sprint window.
    pub end_date: DateTime<Utc>,
    /// Lifecycle state.
    pub status: String,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for issue records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = issues)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IssueRow {
    /// Issue identifier.
    pub id: uuid::Uuid,
    /// Issue title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Board column.
    pub status: String,
    /// Priority.
    pub priority: String,
    /// Position within the column.
    pub rank: i32,
    /// Optimistic concurrency counter.
    pub version: i64,
    /// Sprint the issue is scheduled in.
    pub sprint_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Optional assignee.
    pub assignee: Option<String>,
    /// Reporter.
    pub reporter: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
