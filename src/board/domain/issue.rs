//! Issue aggregate and its enumerated attributes.

use super::{ActorId, BoardDomainError, IssueId, ParseEnumError, ProjectId, SprintId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow column an issue sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    /// Work not yet started.
    Todo,
    /// Work under way.
    InProgress,
    /// Work awaiting review.
    InReview,
    /// Work finished.
    Done,
}

impl IssueStatus {
    /// Every status in workflow order.
    pub const ALL: [Self; 4] = [Self::Todo, Self::InProgress, Self::InReview, Self::Done];

    /// Returns the canonical column key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Done => "DONE",
        }
    }
}

impl TryFrom<&str> for IssueStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "IN_REVIEW" => Ok(Self::InReview),
            "DONE" => Ok(Self::Done),
            _ => Err(ParseEnumError::new("issue status", value)),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuePriority {
    /// Can wait.
    Low,
    /// Normal priority.
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Urgent,
}

impl IssuePriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl TryFrom<&str> for IssuePriority {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "URGENT" => Ok(Self::Urgent),
            _ => Err(ParseEnumError::new("issue priority", value)),
        }
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    title: String,
    description: Option<String>,
    status: IssueStatus,
    priority: IssuePriority,
    sprint_id: SprintId,
    project_id: ProjectId,
    assignee: Option<ActorId>,
    reporter: ActorId,
}

impl IssueDraft {
    /// Creates a draft with the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyIssueTitle`] when the title is blank.
    pub fn new(
        title: impl Into<String>,
        sprint_id: SprintId,
        project_id: ProjectId,
        reporter: ActorId,
    ) -> Result<Self, BoardDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BoardDomainError::EmptyIssueTitle);
        }
        Ok(Self {
            title: trimmed.to_owned(),
            description: None,
            status: IssueStatus::Todo,
            priority: IssuePriority::Medium,
            sprint_id,
            project_id,
            assignee: None,
            reporter,
        })
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

    /// Returns the target column.
    #[must_use]
    pub const fn status(&self) -> IssueStatus {
        self.status
    }

    /// Returns the sprint the issue will be scheduled in.
    #[must_use]
    pub const fn sprint_id(&self) -> SprintId {
        self.sprint_id
    }
}

/// Issue aggregate placed on a sprint board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    id: IssueId,
    title: String,
    description: Option<String>,
    status: IssueStatus,
    priority: IssuePriority,
    rank: u32,
    version: u64,
    sprint_id: SprintId,
    project_id: ProjectId,
    assignee: Option<ActorId>,
    reporter: ActorId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedIssueData {
    /// Persisted identifier.
    pub id: IssueId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted column.
    pub status: IssueStatus,
    /// Persisted priority.
    pub priority: IssuePriority,
    /// Persisted rank within the column.
    pub rank: u32,
    /// Persisted row version.
    pub version: u64,
    /// Owning sprint.
    pub sprint_id: SprintId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Assignee, if any.
    pub assignee: Option<ActorId>,
    /// Reporter.
    pub reporter: ActorId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Creates a new issue from a draft at the given rank.
    #[must_use]
    pub fn new(draft: IssueDraft, rank: u32, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: IssueId::new(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            rank,
            version: 0,
            sprint_id: draft.sprint_id,
            project_id: draft.project_id,
            assignee: draft.assignee,
            reporter: draft.reporter,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs an issue from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedIssueData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            rank: data.rank,
            version: data.version,
            sprint_id: data.sprint_id,
            project_id: data.project_id,
            assignee: data.assignee,
            reporter: data.reporter,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the issue identifier.
    #[must_use]
    pub const fn id(&self) -> IssueId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the column the issue sits in.
    #[must_use]
    pub const fn status(&self) -> IssueStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> IssuePriority {
        self.priority
    }

    /// Returns the zero-based rank within the column.
    #[must_use]
    pub const fn rank(&self) -> u32 {
        self.rank
    }

    /// Returns the row version used for optimistic concurrency control.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the owning sprint.
    #[must_use]
    pub const fn sprint_id(&self) -> SprintId {
        self.sprint_id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<&ActorId> {
        self.assignee.as_ref()
    }

    /// Returns the reporter.
    #[must_use]
    pub const fn reporter(&self) -> &ActorId {
        &self.reporter
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Changes the priority.
    pub fn set_priority(&mut self, priority: IssuePriority, clock: &impl Clock) {
        self.priority = priority;
        self.touch(clock.utc());
    }

    /// Replaces the assignee; `None` unassigns the issue.
    pub fn set_assignee(&mut self, assignee: Option<ActorId>, clock: &impl Clock) {
        self.assignee = assignee;
        self.touch(clock.utc());
    }

    /// Moves the issue within the local board view without touching the
    /// persisted version.
    pub(crate) const fn place(&mut self, status: IssueStatus, rank: u32) {
        self.status = status;
        self.rank = rank;
    }

    /// Applies a committed placement, bumping the row version.
    pub(crate) const fn commit_placement(
        &mut self,
        status: IssueStatus,
        rank: u32,
        at: DateTime<Utc>,
    ) {
        self.place(status, rank);
        self.bump_version();
        self.touch(at);
    }

    /// Records a committed detail edit, bumping the row version.
    pub(crate) const fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }

    const fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
