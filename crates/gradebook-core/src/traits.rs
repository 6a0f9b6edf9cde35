use std::future::Future;

use crate::error::AppError;
use crate::models::Credential;

/// Read access to credential rows, keyed by username.
pub trait CredentialStore: Send + Sync + Clone {
    fn find_credential(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Credential>, AppError>> + Send;
}
