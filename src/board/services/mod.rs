//! Application services for sprint boards.

mod board;
mod error;
mod sprint;

pub use board::{AssigneeChange, BoardService, CreateIssueRequest, UpdateIssueRequest};
pub use error::{BoardServiceError, BoardServiceResult, ErrorKind};
pub use sprint::{CreateSprintRequest, SprintLifecycleService};
