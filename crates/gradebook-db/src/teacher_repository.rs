use gradebook_core::error::AppError;
use gradebook_core::models::{NewTeacher, Role, Teacher, TeacherUpdate};
use sqlx::{PgPool, Pool, Postgres};

use crate::error::{exactly_one, exactly_one_affected, map_db_err};

/// Teachers and their paired `users` rows.
#[derive(Clone)]
pub struct TeacherRepository {
    pool: Pool<Postgres>,
}

impl TeacherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, teacher_id: &str) -> Result<Teacher, AppError> {
        let rows = sqlx::query_as::<_, TeacherRow>(
            r#"
            SELECT teacher_id, firstname, surname, subject_id
            FROM teachers
            WHERE teacher_id = $1
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        exactly_one(rows, "teacher", teacher_id).map(Into::into)
    }

    pub async fn list(&self) -> Result<Vec<Teacher>, AppError> {
        let rows = sqlx::query_as::<_, TeacherRow>(
            r#"
            SELECT teacher_id, firstname, surname, subject_id
            FROM teachers
            ORDER BY teacher_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_subject(&self, subject_id: i32) -> Result<Vec<Teacher>, AppError> {
        let rows = sqlx::query_as::<_, TeacherRow>(
            r#"
            SELECT teacher_id, firstname, surname, subject_id
            FROM teachers
            WHERE subject_id = $1
            ORDER BY teacher_id
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a teacher and its `admin` credential row.
    pub async fn create(&self, teacher: &NewTeacher) -> Result<Teacher, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        sqlx::query("INSERT INTO users (username, password_hash, status) VALUES ($1, $2, $3)")
            .bind(&teacher.teacher_id)
            .bind(&teacher.password_hash)
            .bind(Role::Admin.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        let row = sqlx::query_as::<_, TeacherRow>(
            r#"
            INSERT INTO teachers (teacher_id, firstname, surname, subject_id)
            VALUES ($1, $2, $3, $4)
            RETURNING teacher_id, firstname, surname, subject_id
            "#,
        )
        .bind(&teacher.teacher_id)
        .bind(&teacher.firstname)
        .bind(&teacher.surname)
        .bind(teacher.subject_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(teacher_id = %teacher.teacher_id, subject_id = teacher.subject_id, "Teacher created");
        Ok(row.into())
    }

    /// Replace a teacher's fields; a changed id renames the credential row
    /// and, through the foreign key, the marks the teacher issued.
    pub async fn update(
        &self,
        current_id: &str,
        update: &TeacherUpdate,
    ) -> Result<Teacher, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let row = sqlx::query_as::<_, TeacherRow>(
            r#"
            UPDATE teachers
            SET teacher_id = $1, firstname = $2, surname = $3, subject_id = $4
            WHERE teacher_id = $5
            RETURNING teacher_id, firstname, surname, subject_id
            "#,
        )
        .bind(&update.teacher_id)
        .bind(&update.firstname)
        .bind(&update.surname)
        .bind(update.subject_id)
        .bind(current_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Teacher not found: {current_id}")))?;

        let renamed = sqlx::query(
            "UPDATE users SET username = $1, password_hash = $2 WHERE username = $3",
        )
        .bind(&update.teacher_id)
        .bind(&update.password_hash)
        .bind(current_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        exactly_one_affected(renamed.rows_affected(), current_id)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(from = %current_id, to = %update.teacher_id, "Teacher updated");
        Ok(row.into())
    }

    /// Delete a teacher together with its credential row.
    ///
    /// Fails with a conflict while marks issued by the teacher remain.
    pub async fn delete(&self, teacher_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let deleted = sqlx::query("DELETE FROM teachers WHERE teacher_id = $1")
            .bind(teacher_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Teacher not found: {teacher_id}")));
        }

        let deleted = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(teacher_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        exactly_one_affected(deleted.rows_affected(), teacher_id)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(%teacher_id, "Teacher deleted");
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct TeacherRow {
    teacher_id: String,
    firstname: String,
    surname: String,
    subject_id: i32,
}

impl From<TeacherRow> for Teacher {
    fn from(row: TeacherRow) -> Self {
        Teacher {
            teacher_id: row.teacher_id,
            firstname: row.firstname,
            surname: row.surname,
            subject_id: row.subject_id,
        }
    }
}
