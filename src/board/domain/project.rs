//! Project reference data consumed by the board.
//!
//! Projects are owned by a separate collaborator; the board only needs to
//! know which organization a project belongs to and who administers it.

use super::{ActorId, OrganizationId, ProjectId};
use serde::{Deserialize, Serialize};

/// Project that owns sprints and issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    key: String,
    name: String,
    organization_id: OrganizationId,
    admin_ids: Vec<ActorId>,
}

impl Project {
    /// Creates a project reference.
    #[must_use]
    pub fn new(
        id: ProjectId,
        key: impl Into<String>,
        name: impl Into<String>,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            organization_id,
            admin_ids: Vec::new(),
        }
    }

    /// Sets the project administrators.
    #[must_use]
    pub fn with_admins(mut self, admins: impl IntoIterator<Item = ActorId>) -> Self {
        self.admin_ids = admins.into_iter().collect();
        self
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the short project key, such as `FB`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    /// Returns the administrators.
    #[must_use]
    pub fn admin_ids(&self) -> &[ActorId] {
        &self.admin_ids
    }

    /// Returns whether the project belongs to `organization`.
    #[must_use]
    pub fn belongs_to(&self, organization: &OrganizationId) -> bool {
        &self.organization_id == organization
    }

    /// Returns whether `actor` administers this project.
    #[must_use]
    pub fn is_admin(&self, actor: &ActorId) -> bool {
        self.admin_ids.contains(actor)
    }
}
