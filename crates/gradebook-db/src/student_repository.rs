use gradebook_core::error::AppError;
use gradebook_core::models::{Group, GroupOccupancy, NewStudent, Role, Student, StudentUpdate};
use sqlx::{PgPool, Pool, Postgres};

use crate::error::{exactly_one, exactly_one_affected, map_db_err};

/// Students and their paired `users` rows.
#[derive(Clone)]
pub struct StudentRepository {
    pool: Pool<Postgres>,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch exactly one student by id.
    pub async fn get(&self, student_id: &str) -> Result<Student, AppError> {
        let rows = sqlx::query_as::<_, StudentRow>(
            r#"
            SELECT student_id, firstname, surname, group_id
            FROM students
            WHERE student_id = $1
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        exactly_one(rows, "student", student_id).map(Into::into)
    }

    pub async fn exists(&self, student_id: &str) -> Result<bool, AppError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE student_id = $1)")
            .bind(student_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_err)
    }

    /// Insert a student and its credential row, enforcing group capacity.
    ///
    /// The group row is locked for the duration of the transaction so that
    /// concurrent inserts into the same group see each other's head count.
    pub async fn create(&self, student: &NewStudent) -> Result<Student, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let quantity: Option<i32> =
            sqlx::query_scalar("SELECT quantity FROM groups WHERE group_id = $1 FOR UPDATE")
                .bind(student.group_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_err)?;
        let quantity = quantity
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {}", student.group_id)))?;

        let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE group_id = $1")
            .bind(student.group_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;

        let occupancy = GroupOccupancy {
            group: Group {
                group_id: student.group_id,
                quantity,
            },
            students,
        };
        if !occupancy.has_room() {
            return Err(AppError::CapacityConflict {
                group_id: student.group_id,
                quantity,
            });
        }

        sqlx::query("INSERT INTO users (username, password_hash, status) VALUES ($1, $2, $3)")
            .bind(&student.student_id)
            .bind(&student.password_hash)
            .bind(Role::User.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            INSERT INTO students (student_id, firstname, surname, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING student_id, firstname, surname, group_id
            "#,
        )
        .bind(&student.student_id)
        .bind(&student.firstname)
        .bind(&student.surname)
        .bind(student.group_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(
            student_id = %student.student_id,
            group_id = student.group_id,
            occupancy = students + 1,
            "Student created"
        );
        Ok(row.into())
    }

    /// Replace a student's fields; a changed id renames the credential row too.
    pub async fn update(
        &self,
        current_id: &str,
        update: &StudentUpdate,
    ) -> Result<Student, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let row = sqlx::query_as::<_, StudentRow>(
            r#"
            UPDATE students
            SET student_id = $1, firstname = $2, surname = $3
            WHERE student_id = $4
            RETURNING student_id, firstname, surname, group_id
            "#,
        )
        .bind(&update.student_id)
        .bind(&update.firstname)
        .bind(&update.surname)
        .bind(current_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or_else(|| AppError::NotFound(format!("Student not found: {current_id}")))?;

        let renamed = sqlx::query(
            "UPDATE users SET username = $1, password_hash = $2 WHERE username = $3",
        )
        .bind(&update.student_id)
        .bind(&update.password_hash)
        .bind(current_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        exactly_one_affected(renamed.rows_affected(), current_id)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(from = %current_id, to = %update.student_id, "Student updated");
        Ok(row.into())
    }

    /// Delete a student together with its credential row.
    pub async fn delete(&self, student_id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let deleted = sqlx::query("DELETE FROM students WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Student not found: {student_id}")));
        }

        let deleted = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        exactly_one_affected(deleted.rows_affected(), student_id)?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::info!(%student_id, "Student deleted");
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct StudentRow {
    student_id: String,
    firstname: String,
    surname: String,
    group_id: i32,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            student_id: row.student_id,
            firstname: row.firstname,
            surname: row.surname,
            group_id: row.group_id,
        }
    }
}
