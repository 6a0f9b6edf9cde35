use gradebook_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::catalog_repository::CatalogRepository;
use crate::config::DatabaseConfig;
use crate::mark_repository::MarkRepository;
use crate::student_repository::StudentRepository;
use crate::teacher_repository::TeacherRepository;
use crate::user_repository::UserRepository;

/// Central database facade: owns the connection pool, runs migrations,
/// and vends repository instances.
///
/// Repositories borrow a connection per call and open their own transaction
/// for multi-statement writes; nothing is shared between requests.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL with the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

        Ok(Self { pool })
    }

    /// Create a `Database` from an existing pool (useful for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn student_repo(&self) -> StudentRepository {
        StudentRepository::new(self.pool.clone())
    }

    pub fn teacher_repo(&self) -> TeacherRepository {
        TeacherRepository::new(self.pool.clone())
    }

    pub fn mark_repo(&self) -> MarkRepository {
        MarkRepository::new(self.pool.clone())
    }

    pub fn catalog_repo(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
