//! Domain model for sprint boards.
//!
//! The board domain covers the sprint lifecycle, the ordered column view,
//! the reorder algorithm, and the change sets produced by moves. All
//! infrastructure concerns stay outside of this boundary.

mod board;
mod change;
mod columns;
mod error;
mod filter;
mod ids;
mod issue;
mod project;
mod reorder;
mod sprint;
mod state;

pub use board::{Board, BoardColumn, MoveOutcome, compact_after_removal, next_rank};
pub use change::{BoardPosition, ChangeSet, IssueMove, RankChange};
pub use columns::{BoardColumns, ColumnDefinition};
pub use error::{BoardDomainError, MoveError, ParseEnumError, TransitionRejection};
pub use filter::{BoardFilter, FilteredBoard, FilteredColumn};
pub use ids::{ActorId, IssueId, OrganizationId, ProjectId, SprintId};
pub use issue::{Issue, IssueDraft, IssuePriority, IssueStatus, PersistedIssueData};
pub use project::Project;
pub use reorder::{Reordered, clamp_destination, reorder};
pub use sprint::{PersistedSprintData, Sprint, SprintSchedule, SprintStatus, SprintWithProject};
pub use state::{BoardState, SyncStatus};
