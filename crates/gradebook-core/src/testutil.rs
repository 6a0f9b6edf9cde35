//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! Interior mutability via `Arc<Mutex<_>>` so clones share state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{Credential, Role};
use crate::password::hash_password;
use crate::traits::CredentialStore;

// ---------------------------------------------------------------------------
// MockCredentialStore
// ---------------------------------------------------------------------------

/// In-memory credential table.
#[derive(Clone, Default)]
pub struct MockCredentialStore {
    users: Arc<Mutex<HashMap<String, Credential>>>,
    lookups: Arc<AtomicUsize>,
    fail: bool,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every lookup returns a database error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Insert a user, hashing `password` the same way the server does.
    pub fn insert(&self, username: &str, password: &str, role: Role) {
        let credential = Credential {
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            role,
        };
        self.users
            .lock()
            .unwrap()
            .insert(username.to_string(), credential);
    }

    /// Number of `find_credential` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MockCredentialStore {
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::DatabaseError("connection refused".into()));
        }
        Ok(self.users.lock().unwrap().get(username).cloned())
    }
}
