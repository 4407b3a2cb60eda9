//! Fixed-identity authenticator for tests and local tooling.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::board::ports::{Actor, AuthError, Authenticator};

/// Authenticator returning whichever actor was last configured.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    current: Arc<RwLock<Option<Actor>>>,
}

impl StaticAuthenticator {
    /// Creates an authenticator that always resolves `actor`.
    #[must_use]
    pub fn signed_in(actor: Actor) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(actor))),
        }
    }

    /// Creates an authenticator with nobody signed in.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Replaces the signed-in actor.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Provider`] if the lock is poisoned.
    pub fn switch_to(&self, actor: Option<Actor>) -> Result<(), AuthError> {
        let mut current = self
            .current
            .write()
            .map_err(|err| AuthError::Provider(err.to_string()))?;
        *current = actor;
        Ok(())
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self) -> Result<Actor, AuthError> {
        let current = self
            .current
            .read()
            .map_err(|err| AuthError::Provider(err.to_string()))?;
        current.clone().ok_or(AuthError::Unauthenticated)
    }
}
