//! Authentication and authorization gate.
//!
//! Independent of HTTP: the server's middleware feeds it the decoded
//! basic-auth pair, tests can drive it directly with a mock store.

use crate::error::AppError;
use crate::models::{Credential, Role};
use crate::password::{verify_dummy, verify_password};
use crate::traits::CredentialStore;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    /// Ownership check: the caller may only act on the record it owns.
    pub fn require_owner(&self, subject_id: &str) -> Result<(), AppError> {
        if self.username == subject_id {
            Ok(())
        } else {
            tracing::warn!(
                caller = %self.username,
                subject = %subject_id,
                "Ownership check failed"
            );
            Err(AppError::access_denied())
        }
    }
}

/// Verifies credentials and resolves roles against a [`CredentialStore`].
#[derive(Clone)]
pub struct Gate<S> {
    store: S,
}

impl<S: CredentialStore> Gate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the username if `secret` matches the stored hash.
    ///
    /// Lookup errors, unknown users and hash mismatches all yield `None`.
    pub async fn authenticate(&self, username: &str, secret: &str) -> Option<String> {
        self.verify(username, secret).await.map(|c| c.username)
    }

    /// Fetch the credential once and check `secret` against it off the async
    /// workers. Unknown users are checked against a dummy hash instead.
    async fn verify(&self, username: &str, secret: &str) -> Option<Credential> {
        let credential = match self.store.find_credential(username).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, username, "Credential lookup failed");
                None
            }
        };

        let secret = secret.to_owned();
        let outcome = tokio::task::spawn_blocking(move || match credential {
            Some(credential) if verify_password(&secret, &credential.password_hash) => {
                Some(credential)
            }
            Some(_) => None,
            None => {
                verify_dummy(&secret);
                None
            }
        })
        .await;

        outcome.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            None
        })
    }

    /// Returns the stored role for `username`, if the user exists.
    pub async fn resolve_role(&self, username: &str) -> Option<Role> {
        match self.store.find_credential(username).await {
            Ok(credential) => credential.map(|c| c.role),
            Err(e) => {
                tracing::warn!(error = %e, username, "Role lookup failed");
                None
            }
        }
    }

    /// Authenticate `credentials` and require one of `allowed` roles.
    ///
    /// An empty `allowed` list admits any authenticated caller.
    pub async fn admit(
        &self,
        credentials: Option<(&str, &str)>,
        allowed: &[Role],
    ) -> Result<Identity, AppError> {
        let (username, secret) = credentials.ok_or(AppError::Unauthenticated)?;

        let Credential { username, role, .. } = self
            .verify(username, secret)
            .await
            .ok_or(AppError::Unauthenticated)?;

        if !allowed.is_empty() && !allowed.contains(&role) {
            tracing::warn!(%username, %role, ?allowed, "Role check failed");
            return Err(AppError::Forbidden(format!(
                "Role '{role}' may not access this resource"
            )));
        }

        Ok(Identity { username, role })
    }
}
