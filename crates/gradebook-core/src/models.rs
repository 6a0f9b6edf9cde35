use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// Coarse permission tag stored on every credential row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A student.
    User,
    /// A teacher.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// A credential row: one per student or teacher, sharing its identifier.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    /// PHC-formatted Argon2 hash.
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub student_id: String,
    pub firstname: String,
    pub surname: String,
    pub group_id: i32,
}

/// Insert payload for a student and its credential row.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_id: String,
    pub firstname: String,
    pub surname: String,
    pub password_hash: String,
    pub group_id: i32,
}

/// Replacement values for `PUT /student/{id}`. `student_id` may rename the row.
#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub student_id: String,
    pub firstname: String,
    pub surname: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
    pub teacher_id: String,
    pub firstname: String,
    pub surname: String,
    pub subject_id: i32,
}

#[derive(Debug, Clone)]
pub struct NewTeacher {
    pub teacher_id: String,
    pub firstname: String,
    pub surname: String,
    pub password_hash: String,
    pub subject_id: i32,
}

/// Teachers replace every field on update, so the shape matches [`NewTeacher`].
pub type TeacherUpdate = NewTeacher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub group_id: i32,
    /// Maximum number of students.
    pub quantity: i32,
}

/// A group together with its current head count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOccupancy {
    pub group: Group,
    pub students: i64,
}

impl GroupOccupancy {
    /// Whether one more student still fits.
    pub fn has_room(&self) -> bool {
        self.students + 1 <= i64::from(self.group.quantity)
    }
}

/// One grade event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub mark_id: i32,
    pub student_id: String,
    pub subject_id: i32,
    pub teacher_id: String,
    pub date: NaiveDate,
    pub value: i32,
}

/// Fields a teacher may change on an existing mark.
#[derive(Debug, Clone)]
pub struct MarkUpdate {
    pub date: NaiveDate,
    pub value: i32,
    pub subject_id: i32,
    pub teacher_id: String,
}
