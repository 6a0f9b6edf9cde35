pub mod auth;
pub mod error;
pub mod models;
pub mod password;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use auth::{Gate, Identity};
pub use error::AppError;
pub use models::{
    Credential, Group, GroupOccupancy, Mark, MarkUpdate, NewStudent, NewTeacher, Role, Student,
    StudentUpdate, Teacher, TeacherUpdate,
};
pub use traits::CredentialStore;
