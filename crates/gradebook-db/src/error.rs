use std::fmt::Display;

use gradebook_core::AppError;
use sqlx::error::ErrorKind;

/// Translate a `sqlx` error, surfacing constraint violations as conflicts.
pub(crate) fn map_db_err(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return AppError::Conflict(format!("Already exists: {}", db_err.message()));
            }
            ErrorKind::ForeignKeyViolation => {
                return AppError::Conflict(format!(
                    "Referenced row missing or still in use: {}",
                    db_err.message()
                ));
            }
            _ => {}
        }
    }
    AppError::DatabaseError(err.to_string())
}

/// Collapse a result set that must hold exactly one row.
pub(crate) fn exactly_one<T>(
    mut rows: Vec<T>,
    entity: &'static str,
    key: impl Display,
) -> Result<T, AppError> {
    match rows.len() {
        0 => Err(AppError::NotFound(format!("{} not found: {key}", capitalize(entity)))),
        1 => Ok(rows.remove(0)),
        found => Err(AppError::Multiplicity { entity, found }),
    }
}

/// Every student and teacher owns exactly one credential row.
pub(crate) fn exactly_one_affected(rows: u64, username: &str) -> Result<(), AppError> {
    if rows == 1 {
        Ok(())
    } else {
        tracing::error!(%username, rows, "Credential row out of sync");
        Err(AppError::Multiplicity {
            entity: "user",
            found: rows as usize,
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
