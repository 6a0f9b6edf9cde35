use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use gradebook_core::models::{Mark, Student, Teacher};

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(length(min = 1, max = 100))]
    pub firstname: String,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub group_id: i32,
}

/// Body of `PUT /student/{id}`. A different `StudentId` renames the student.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(length(min = 1, max = 100))]
    pub firstname: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct StudentView {
    pub student_id: String,
    pub firstname: String,
    pub surname: String,
    pub group_id: i32,
}

impl From<Student> for StudentView {
    fn from(s: Student) -> Self {
        Self {
            student_id: s.student_id,
            firstname: s.firstname,
            surname: s.surname,
            group_id: s.group_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    #[serde(rename = "Student")]
    pub student: StudentView,
}

// ---------------------------------------------------------------------------
// Teachers
// ---------------------------------------------------------------------------

/// True for path segments `GET /teachers/{id}` treats as a SubjectId.
pub fn is_subject_key(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn not_subject_key(teacher_id: &str) -> Result<(), ValidationError> {
    if is_subject_key(teacher_id) {
        let mut err = ValidationError::new("numeric_teacher_id");
        err.message = Some("TeacherId must contain a non-digit character".into());
        return Err(err);
    }
    Ok(())
}

/// Body of both `POST /teachers` and `PUT /teachers/{id}`.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TeacherRequest {
    /// Must contain a non-digit: all-digit ids address subjects.
    #[validate(length(min = 1, max = 64), custom(function = "not_subject_key"))]
    pub teacher_id: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub firstname: String,
    #[validate(length(min = 1, max = 100))]
    pub surname: String,
    pub subject_id: i32,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TeacherView {
    pub teacher_id: String,
    pub firstname: String,
    pub surname: String,
    pub subject_id: i32,
}

impl From<Teacher> for TeacherView {
    fn from(t: Teacher) -> Self {
        Self {
            teacher_id: t.teacher_id,
            firstname: t.firstname,
            surname: t.surname,
            subject_id: t.subject_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TeacherResponse {
    #[serde(rename = "Teacher")]
    pub teacher: TeacherView,
}

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMarkRequest {
    pub mark_id: i32,
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    pub value: i32,
    pub subject_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
    #[validate(length(min = 1, max = 64))]
    pub teacher_id: String,
}

impl From<CreateMarkRequest> for Mark {
    fn from(body: CreateMarkRequest) -> Self {
        Mark {
            mark_id: body.mark_id,
            student_id: body.student_id,
            subject_id: body.subject_id,
            teacher_id: body.teacher_id,
            date: body.date,
            value: body.value,
        }
    }
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateMarkRequest {
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    pub value: i32,
    pub subject_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub teacher_id: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct MarkView {
    pub mark_id: i32,
    pub student_id: String,
    pub subject_id: i32,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub value: i32,
}

impl From<Mark> for MarkView {
    fn from(m: Mark) -> Self {
        Self {
            mark_id: m.mark_id,
            student_id: m.student_id,
            subject_id: m.subject_id,
            teacher_id: m.teacher_id,
            date: m.date,
            value: m.value,
        }
    }
}

/// Project a list of entities, keeping query order.
pub fn project<T, V: From<T>>(rows: Vec<T>) -> Vec<V> {
    rows.into_iter().map(V::from).collect()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
