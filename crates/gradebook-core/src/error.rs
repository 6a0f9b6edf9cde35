use thiserror::Error;

/// Application-wide error types for the gradebook service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Credentials missing, unknown, or not matching the stored hash.
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is authenticated but lacks the role or ownership.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Request body missing a field or carrying a malformed one.
    #[error("Invalid data: {0}")]
    Validation(String),

    /// Adding a student would push a group past its capacity.
    #[error("Can't add student to group {group_id}: capacity of {quantity} reached")]
    CapacityConflict { group_id: i32, quantity: i32 },

    /// Write collides with existing rows (duplicate key, row still referenced).
    #[error("{0}")]
    Conflict(String),

    /// A lookup expected exactly one row.
    #[error("Expected exactly one {entity}, found {found}")]
    Multiplicity { entity: &'static str, found: usize },

    /// Password hashing failed.
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Convenience constructor for the ownership / role denial message.
    pub fn access_denied() -> Self {
        AppError::Forbidden("Access denied".into())
    }

    /// Returns true if the error was caused by the caller rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AppError::Multiplicity { .. }
                | AppError::PasswordHash(_)
                | AppError::DatabaseError(_)
                | AppError::ConfigError(_)
        )
    }
}
