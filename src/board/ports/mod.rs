//! Port contracts for sprint boards.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod identity;
pub mod repository;

pub use identity::{Actor, AuthError, Authenticator};
pub use repository::{
    BoardRepositoryError, BoardRepositoryResult, IssueRepository, SprintRepository,
};
