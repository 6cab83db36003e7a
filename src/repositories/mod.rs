pub mod application_repository;
pub mod job_filter;
pub mod job_repository;
pub mod news_repository;
pub mod user_repository;

pub use application_repository::{ApplicationRepository, SqliteApplicationRepository};
pub use job_filter::JobFilter;
pub use job_repository::{DeletedJob, JobRepository, SqliteJobRepository};
pub use news_repository::{NewsRepository, SqliteNewsRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Referenced {0} does not exist")]
    MissingReference(&'static str),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
