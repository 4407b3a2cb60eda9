//! Sprint aggregate and its lifecycle state machine.

use super::{BoardDomainError, ParseEnumError, Project, ProjectId, SprintId, TransitionRejection};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sprint lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    /// Created but not started; the board is read-only.
    Planned,
    /// Running; the board accepts moves.
    Active,
    /// Finished; the board is permanently read-only.
    Completed,
}

impl SprintStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
        }
    }

    /// Returns whether the lifecycle allows moving from `self` to `target`,
    /// ignoring date bounds.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Planned, Self::Active) | (Self::Active, Self::Completed)
        )
    }

    /// Returns whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl TryFrom<&str> for SprintStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "PLANNED" => Ok(Self::Planned),
            "ACTIVE" => Ok(Self::Active),
            "COMPLETED" => Ok(Self::Completed),
            _ => Err(ParseEnumError::new("sprint status", value)),
        }
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing summary of where a sprint stands relative to its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintSchedule {
    /// Planned sprint whose start lies in the future.
    StartsIn(Duration),
    /// Active sprint that has run past its end date.
    Overdue(Duration),
    /// Completed sprint.
    Ended,
    /// Nothing noteworthy.
    OnTrack,
}

/// Sprint aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    id: SprintId,
    name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: SprintStatus,
    project_id: ProjectId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted sprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSprintData {
    /// Persisted identifier.
    pub id: SprintId,
    /// Persisted name.
    pub name: String,
    /// Start of the sprint window.
    pub start_date: DateTime<Utc>,
    /// End of the sprint window.
    pub end_date: DateTime<Utc>,
    /// Persisted lifecycle state.
    pub status: SprintStatus,
    /// Owning project.
    pub project_id: ProjectId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Sprint {
    /// Creates a planned sprint.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptySprintName`] for a blank name and
    /// [`BoardDomainError::InvalidDateRange`] when `start` is after `end`.
    pub fn new(
        name: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        project_id: ProjectId,
        clock: &impl Clock,
    ) -> Result<Self, BoardDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BoardDomainError::EmptySprintName);
        }
        if start_date > end_date {
            return Err(BoardDomainError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: SprintId::new(),
            name: trimmed.to_owned(),
            start_date,
            end_date,
            status: SprintStatus::Planned,
            project_id,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a sprint from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSprintData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            start_date: data.start_date,
            end_date: data.end_date,
            status: data.status,
            project_id: data.project_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the sprint identifier.
    #[must_use]
    pub const fn id(&self) -> SprintId {
        self.id
    }

    /// Returns the sprint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the start of the sprint window.
    #[must_use]
    pub const fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Returns the end of the sprint window.
    #[must_use]
    pub const fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> SprintStatus {
        self.status
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `now` falls inside the sprint window, both ends
    /// inclusive.
    #[must_use]
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_date && now <= self.end_date
    }

    /// Returns whether [`Self::transition_to`] would accept `Active` at `now`.
    #[must_use]
    pub fn can_start(&self, now: DateTime<Utc>) -> bool {
        self.status == SprintStatus::Planned && self.is_within_window(now)
    }

    /// Returns whether the sprint can be completed.
    #[must_use]
    pub fn can_complete(&self) -> bool {
        self.status == SprintStatus::Active
    }

    /// Checks the transition to `target` against the lifecycle and the date
    /// window without mutating the sprint.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidTransition`] when the transition is
    /// not permitted at `now`.
    pub fn check_transition(
        &self,
        target: SprintStatus,
        now: DateTime<Utc>,
    ) -> Result<(), BoardDomainError> {
        let rejection = match (self.status, target) {
            (SprintStatus::Planned, SprintStatus::Active) if !self.is_within_window(now) => {
                Some(TransitionRejection::OutsideDateRange)
            }
            (from, to) if from.can_transition_to(to) => None,
            (from, SprintStatus::Completed) if from != SprintStatus::Completed => {
                Some(TransitionRejection::NotActive)
            }
            _ => Some(TransitionRejection::Unsupported),
        };

        match rejection {
            None => Ok(()),
            Some(reason) => Err(BoardDomainError::InvalidTransition {
                sprint_id: self.id,
                from: self.status,
                to: target,
                reason,
            }),
        }
    }

    /// Moves the sprint to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::InvalidTransition`] when the lifecycle or
    /// the date window forbids the change; the sprint is left untouched.
    pub fn transition_to(
        &mut self,
        target: SprintStatus,
        clock: &impl Clock,
    ) -> Result<(), BoardDomainError> {
        let now = clock.utc();
        self.check_transition(target, now)?;
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    /// Rejects board mutations unless the sprint is active.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::BoardLocked`] for planned and completed
    /// sprints.
    pub fn ensure_board_unlocked(&self) -> Result<(), BoardDomainError> {
        ensure_unlocked(self.id, self.status)
    }

    /// Summarizes the sprint's position relative to its dates.
    #[must_use]
    pub fn schedule(&self, now: DateTime<Utc>) -> SprintSchedule {
        match self.status {
            SprintStatus::Completed => SprintSchedule::Ended,
            SprintStatus::Active if now > self.end_date => {
                SprintSchedule::Overdue(now - self.end_date)
            }
            SprintStatus::Planned if now < self.start_date => {
                SprintSchedule::StartsIn(self.start_date - now)
            }
            _ => SprintSchedule::OnTrack,
        }
    }
}

/// Board mutation gate shared by sprints and materialized boards.
pub(crate) const fn ensure_unlocked(
    sprint_id: SprintId,
    status: SprintStatus,
) -> Result<(), BoardDomainError> {
    match status {
        SprintStatus::Active => Ok(()),
        SprintStatus::Planned | SprintStatus::Completed => {
            Err(BoardDomainError::BoardLocked { sprint_id, status })
        }
    }
}

/// A sprint resolved together with the project that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintWithProject {
    /// The sprint.
    pub sprint: Sprint,
    /// Its owning project.
    pub project: Project,
}
