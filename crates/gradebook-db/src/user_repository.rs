use gradebook_core::error::AppError;
use gradebook_core::models::Credential;
use gradebook_core::traits::CredentialStore;
use sqlx::{PgPool, Pool, Postgres};

use crate::error::map_db_err;

/// Read side of the `users` credential table.
///
/// Writes happen inside the student/teacher repositories so the credential
/// row always changes in the same transaction as its owner.
#[derive(Clone)]
pub struct UserRepository {
    pool: Pool<Postgres>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, username: &str) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT username, password_hash, status
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        row.map(Credential::try_from).transpose()
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct UserRow {
    username: String,
    password_hash: String,
    status: String,
}

impl TryFrom<UserRow> for Credential {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.status.parse().map_err(AppError::DatabaseError)?;
        Ok(Credential {
            username: row.username,
            password_hash: row.password_hash,
            role,
        })
    }
}

// -- Trait implementation --

impl CredentialStore for UserRepository {
    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, AppError> {
        self.find(username).await
    }
}
