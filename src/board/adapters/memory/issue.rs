//! In-memory issue repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::board::{
    domain::{ChangeSet, Issue, IssueId, RankChange, SprintId},
    ports::{BoardRepositoryError, BoardRepositoryResult, IssueRepository},
};

/// Thread-safe in-memory issue repository.
///
/// Batches are applied to a staged copy and swapped in only when every row
/// succeeds, so readers never observe a partial batch.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueRepository {
    state: Arc<RwLock<InMemoryIssueState>>,
}

#[derive(Debug, Default)]
struct InMemoryIssueState {
    issues: HashMap<IssueId, Issue>,
    fail_batch_after: Option<usize>,
}

impl InMemoryIssueRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next batch write fail after `rows` rows have been staged.
    ///
    /// The injected failure is consumed by the next call to
    /// [`IssueRepository::persist_batch`] or [`IssueRepository::delete`].
    ///
    /// # Errors
    ///
    /// Returns [`BoardRepositoryError::Persistence`] if the state lock is
    /// poisoned.
    pub fn fail_next_batch_after(&self, rows: usize) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        state.fail_batch_after = Some(rows);
        Ok(())
    }

    fn read(&self) -> BoardRepositoryResult<RwLockReadGuard<'_, InMemoryIssueState>> {
        self.state.read().map_err(|err| {
            BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> BoardRepositoryResult<RwLockWriteGuard<'_, InMemoryIssueState>> {
        self.state.write().map_err(|err| {
            BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

/// Applies placements to `staged`, honouring an injected failure.
fn stage_changes(
    staged: &mut HashMap<IssueId, Issue>,
    sprint_id: SprintId,
    changes: &[RankChange],
    fail_after: Option<usize>,
    committed_at: DateTime<Utc>,
) -> BoardRepositoryResult<()> {
    for (written, change) in changes.iter().enumerate() {
        if fail_after == Some(written) {
            return Err(BoardRepositoryError::persistence(std::io::Error::other(
                format!("injected failure after {written} rows"),
            )));
        }
        let issue = staged
            .get_mut(&change.issue_id)
            .ok_or(BoardRepositoryError::IssueNotFound(change.issue_id))?;
        if issue.sprint_id() != sprint_id {
            return Err(BoardRepositoryError::SprintMismatch {
                issue_id: change.issue_id,
                sprint_id,
            });
        }
        ensure_version(issue, change.expected_version)?;
        issue.commit_placement(change.status, change.rank, committed_at);
    }
    Ok(())
}

const fn ensure_version(stored: &Issue, expected: u64) -> BoardRepositoryResult<()> {
    if stored.version() == expected {
        Ok(())
    } else {
        Err(BoardRepositoryError::VersionConflict {
            issue_id: stored.id(),
            expected,
            actual: stored.version(),
        })
    }
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn store(&self, issue: &Issue) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        if state.issues.contains_key(&issue.id()) {
            return Err(BoardRepositoryError::DuplicateIssue(issue.id()));
        }
        state.issues.insert(issue.id(), issue.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: IssueId) -> BoardRepositoryResult<Option<Issue>> {
        let state = self.read()?;
        Ok(state.issues.get(&id).cloned())
    }

    async fn find_by_sprint(&self, sprint_id: SprintId) -> BoardRepositoryResult<Vec<Issue>> {
        let state = self.read()?;
        Ok(state
            .issues
            .values()
            .filter(|issue| issue.sprint_id() == sprint_id)
            .cloned()
            .collect())
    }

    async fn update_details(&self, issue: &Issue) -> BoardRepositoryResult<Issue> {
        let mut state = self.write()?;
        let stored = state
            .issues
            .get_mut(&issue.id())
            .ok_or(BoardRepositoryError::IssueNotFound(issue.id()))?;
        ensure_version(stored, issue.version())?;
        let mut updated = issue.clone();
        updated.bump_version();
        *stored = updated.clone();
        Ok(updated)
    }

    async fn persist_batch(
        &self,
        changes: &ChangeSet,
        committed_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        let fail_after = state.fail_batch_after.take();
        let mut staged = state.issues.clone();
        stage_changes(
            &mut staged,
            changes.sprint_id(),
            changes.changes(),
            fail_after,
            committed_at,
        )?;
        state.issues = staged;
        Ok(())
    }

    async fn delete(
        &self,
        issue: &Issue,
        compaction: &[RankChange],
        committed_at: DateTime<Utc>,
    ) -> BoardRepositoryResult<()> {
        let mut state = self.write()?;
        let fail_after = state.fail_batch_after.take();
        let mut staged = state.issues.clone();
        let removed = staged
            .remove(&issue.id())
            .ok_or(BoardRepositoryError::IssueNotFound(issue.id()))?;
        ensure_version(&removed, issue.version())?;
        stage_changes(
            &mut staged,
            removed.sprint_id(),
            compaction,
            fail_after,
            committed_at,
        )?;
        state.issues = staged;
        Ok(())
    }
}
