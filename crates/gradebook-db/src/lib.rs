pub mod catalog_repository;
pub mod config;
pub mod database;
mod error;
pub mod mark_repository;
pub mod student_repository;
pub mod teacher_repository;
pub mod user_repository;

pub use catalog_repository::CatalogRepository;
pub use config::DatabaseConfig;
pub use database::Database;
pub use mark_repository::MarkRepository;
pub use student_repository::StudentRepository;
pub use teacher_repository::TeacherRepository;
pub use user_repository::UserRepository;
