//! In-memory adapters for board ports.

mod clock;
mod identity;
mod issue;
mod sprint;

pub use clock::FixedClock;
pub use identity::StaticAuthenticator;
pub use issue::InMemoryIssueRepository;
pub use sprint::InMemorySprintRepository;
