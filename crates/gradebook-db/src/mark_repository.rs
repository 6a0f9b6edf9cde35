use chrono::NaiveDate;
use gradebook_core::error::AppError;
use gradebook_core::models::{Mark, MarkUpdate};
use sqlx::{PgPool, Pool, Postgres};

use crate::error::map_db_err;

/// Repository for grade events. Marks are keyed by `(student_id, mark_id)`.
#[derive(Clone)]
pub struct MarkRepository {
    pool: Pool<Postgres>,
}

impl MarkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, mark: &Mark) -> Result<Mark, AppError> {
        let row = sqlx::query_as::<_, MarkRow>(
            r#"
            INSERT INTO marks (mark_id, student_id, subject_id, teacher_id, date, value)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING mark_id, student_id, subject_id, teacher_id, date, value
            "#,
        )
        .bind(mark.mark_id)
        .bind(&mark.student_id)
        .bind(mark.subject_id)
        .bind(&mark.teacher_id)
        .bind(mark.date)
        .bind(mark.value)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        tracing::info!(
            mark_id = mark.mark_id,
            student_id = %mark.student_id,
            teacher_id = %mark.teacher_id,
            "Mark created"
        );
        Ok(row.into())
    }

    pub async fn exists(&self, student_id: &str, mark_id: i32) -> Result<bool, AppError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM marks WHERE student_id = $1 AND mark_id = $2)",
        )
        .bind(student_id)
        .bind(mark_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    pub async fn update(
        &self,
        student_id: &str,
        mark_id: i32,
        update: &MarkUpdate,
    ) -> Result<Mark, AppError> {
        let row = sqlx::query_as::<_, MarkRow>(
            r#"
            UPDATE marks
            SET date = $1, value = $2, subject_id = $3, teacher_id = $4
            WHERE student_id = $5 AND mark_id = $6
            RETURNING mark_id, student_id, subject_id, teacher_id, date, value
            "#,
        )
        .bind(update.date)
        .bind(update.value)
        .bind(update.subject_id)
        .bind(&update.teacher_id)
        .bind(student_id)
        .bind(mark_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Mark not found: {mark_id}")))?;

        tracing::info!(mark_id, %student_id, teacher_id = %update.teacher_id, "Mark updated");
        Ok(row.into())
    }

    pub async fn delete(&self, student_id: &str, mark_id: i32) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM marks WHERE student_id = $1 AND mark_id = $2")
            .bind(student_id)
            .bind(mark_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Mark not found: {mark_id}")));
        }

        tracing::info!(mark_id, %student_id, "Mark deleted");
        Ok(())
    }

    /// All marks of one student, in mark id order.
    pub async fn list_for_student(&self, student_id: &str) -> Result<Vec<Mark>, AppError> {
        let rows = sqlx::query_as::<_, MarkRow>(
            r#"
            SELECT mark_id, student_id, subject_id, teacher_id, date, value
            FROM marks
            WHERE student_id = $1
            ORDER BY mark_id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_for_student_in_subject(
        &self,
        student_id: &str,
        subject_id: i32,
    ) -> Result<Vec<Mark>, AppError> {
        let rows = sqlx::query_as::<_, MarkRow>(
            r#"
            SELECT mark_id, student_id, subject_id, teacher_id, date, value
            FROM marks
            WHERE student_id = $1 AND subject_id = $2
            ORDER BY mark_id
            "#,
        )
        .bind(student_id)
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct MarkRow {
    mark_id: i32,
    student_id: String,
    subject_id: i32,
    teacher_id: String,
    date: NaiveDate,
    value: i32,
}

impl From<MarkRow> for Mark {
    fn from(row: MarkRow) -> Self {
        Mark {
            mark_id: row.mark_id,
            student_id: row.student_id,
            subject_id: row.subject_id,
            teacher_id: row.teacher_id,
            date: row.date,
            value: row.value,
        }
    }
}
