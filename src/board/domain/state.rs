//! Caller-owned optimistic board state.
//!
//! The UI applies a move locally before the commit outcome is known. This
//! type tracks which local revision is waiting on the server so that late
//! commit results never clobber newer state.

use super::{Board, BoardDomainError, ChangeSet, IssueMove};

/// Synchronization status of the local board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local state matches what was last fetched or committed.
    Synced,
    /// A change set for `revision` is being committed.
    Pending {
        /// Local revision awaiting acknowledgement.
        revision: u64,
    },
    /// Committing `revision` failed; the local view may differ from storage.
    Unsynced {
        /// Local revision whose commit failed.
        revision: u64,
        /// Human-readable failure description.
        reason: String,
    },
}

/// Versioned local board owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    board: Board,
    revision: u64,
    sync: SyncStatus,
}

impl BoardState {
    /// Wraps a freshly fetched board.
    #[must_use]
    pub const fn new(board: Board) -> Self {
        Self {
            board,
            revision: 0,
            sync: SyncStatus::Synced,
        }
    }

    /// Returns the current local board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the local revision counter.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the synchronization status.
    #[must_use]
    pub const fn sync_status(&self) -> &SyncStatus {
        &self.sync
    }

    /// Returns whether no commit is outstanding or failed.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self.sync, SyncStatus::Synced)
    }

    /// Applies a move optimistically and returns the change set to commit,
    /// stamped with the new local revision.
    ///
    /// Only one change set is outstanding at a time: its rows carry the
    /// versions storage holds, and a later move computed before the commit
    /// result is known would carry the same stale versions. A no-op move
    /// leaves the revision untouched and returns an empty change set, even
    /// while a commit is outstanding.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::CommitPending`] while a commit is
    /// outstanding, [`BoardDomainError::BoardOutOfSync`] after a failed
    /// commit until [`Self::replace`], and propagates [`Board::apply_move`]
    /// errors. The state is unchanged on error.
    pub fn apply(&mut self, issue_move: &IssueMove) -> Result<ChangeSet, BoardDomainError> {
        let outcome = self.board.apply_move(issue_move)?;
        if outcome.changes.is_empty() {
            return Ok(outcome.changes.with_revision(self.revision));
        }
        match self.sync {
            SyncStatus::Synced => {}
            SyncStatus::Pending { revision } => {
                return Err(BoardDomainError::CommitPending { revision });
            }
            SyncStatus::Unsynced { revision, .. } => {
                return Err(BoardDomainError::BoardOutOfSync { revision });
            }
        }
        self.revision += 1;
        self.board = outcome.board;
        self.sync = SyncStatus::Pending {
            revision: self.revision,
        };
        Ok(outcome.changes.with_revision(self.revision))
    }

    /// Records a successful commit of the outstanding change set, bumping
    /// the committed rows' versions locally.
    ///
    /// Returns `false` and changes nothing when `committed` is not the
    /// outstanding revision, e.g. a late result for a board that has since
    /// been replaced.
    pub fn acknowledge(&mut self, committed: &ChangeSet) -> bool {
        if !self.is_outstanding(committed.revision()) {
            return false;
        }
        self.board.record_committed(committed);
        self.sync = SyncStatus::Synced;
        true
    }

    /// Flags the local view as diverged after the outstanding commit failed.
    ///
    /// The flag sticks until [`Self::replace`]; acknowledgements cannot
    /// clear it. Returns `false` when `revision` is not outstanding.
    pub fn mark_unsynced(&mut self, revision: u64, reason: impl Into<String>) -> bool {
        if !self.is_outstanding(revision) {
            return false;
        }
        self.sync = SyncStatus::Unsynced {
            revision,
            reason: reason.into(),
        };
        true
    }

    /// Re-bases on a board re-fetched from storage, discarding optimistic
    /// changes.
    pub fn replace(&mut self, board: Board) {
        self.revision += 1;
        self.board = board;
        self.sync = SyncStatus::Synced;
    }

    const fn is_outstanding(&self, revision: u64) -> bool {
        matches!(self.sync, SyncStatus::Pending { revision: pending } if pending == revision)
    }
}
