//! Identity port resolving the acting user and organization.

use crate::board::domain::{ActorId, OrganizationId};
use async_trait::async_trait;
use thiserror::Error;

/// Signed-in user acting within an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub actor_id: ActorId,
    /// Organization the user is acting in.
    pub organization_id: OrganizationId,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub const fn new(actor_id: ActorId, organization_id: OrganizationId) -> Self {
        Self {
            actor_id,
            organization_id,
        }
    }
}

/// Resolves who is calling.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the current actor.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when nobody is signed in or no organization is
    /// selected.
    async fn authenticate(&self) -> Result<Actor, AuthError>;
}

/// Errors raised while resolving the current actor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Nobody is signed in.
    #[error("no signed-in user")]
    Unauthenticated,

    /// The user has not selected an organization.
    #[error("no active organization")]
    NoOrganization,

    /// The identity provider could not be reached or answered garbage.
    #[error("identity provider failure: {0}")]
    Provider(String),
}
