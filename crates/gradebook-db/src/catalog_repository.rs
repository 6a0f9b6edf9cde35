use gradebook_core::error::AppError;
use gradebook_core::models::{Group, GroupOccupancy};
use sqlx::{PgPool, Pool, Postgres};

use crate::error::map_db_err;

/// Subjects and groups: reference data provisioned by operators.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: Pool<Postgres>,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_subject(&self, subject_id: i32) -> Result<(), AppError> {
        sqlx::query("INSERT INTO subjects (subject_id) VALUES ($1)")
            .bind(subject_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        tracing::info!(subject_id, "Subject created");
        Ok(())
    }

    pub async fn subject_exists(&self, subject_id: i32) -> Result<bool, AppError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subjects WHERE subject_id = $1)")
            .bind(subject_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    pub async fn create_group(&self, group: Group) -> Result<(), AppError> {
        if group.quantity < 0 {
            return Err(AppError::Validation(format!(
                "Group capacity must not be negative, got {}",
                group.quantity
            )));
        }

        sqlx::query("INSERT INTO groups (group_id, quantity) VALUES ($1, $2)")
            .bind(group.group_id)
            .bind(group.quantity)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        tracing::info!(group_id = group.group_id, quantity = group.quantity, "Group created");
        Ok(())
    }

    /// Current head count of a group, or `None` if the group does not exist.
    pub async fn occupancy(&self, group_id: i32) -> Result<Option<GroupOccupancy>, AppError> {
        let row: Option<(i32, i32, i64)> = sqlx::query_as(
            r#"
            SELECT g.group_id, g.quantity, COUNT(s.student_id)
            FROM groups g
            LEFT JOIN students s ON s.group_id = g.group_id
            WHERE g.group_id = $1
            GROUP BY g.group_id, g.quantity
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(|(group_id, quantity, students)| GroupOccupancy {
            group: Group { group_id, quantity },
            students,
        }))
    }
}
