pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod router;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use config::TokenConfig;
use repositories::{
    NewsRepository, SqliteApplicationRepository, SqliteJobRepository, SqliteNewsRepository,
    SqliteUserRepository,
};
use services::{
    ApplicationService, AuthService, BlobStore, JobService, TokenService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub job_service: Arc<JobService>,
    pub application_service: Arc<ApplicationService>,
    pub news_repository: Arc<dyn NewsRepository>,
    pub max_upload_bytes: usize,
    pub pool: sqlx::SqlitePool,
}

impl AppState {
    /// Wire the sqlite repositories and the services on top of them.
    pub fn new(
        pool: sqlx::SqlitePool,
        token: &TokenConfig,
        blob_store: Arc<dyn BlobStore>,
        max_upload_bytes: usize,
    ) -> Self {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let job_repository = Arc::new(SqliteJobRepository::new(pool.clone()));
        let application_repository = Arc::new(SqliteApplicationRepository::new(pool.clone()));
        let news_repository = Arc::new(SqliteNewsRepository::new(pool.clone()));

        let token_service = Arc::new(TokenService::new(token));
        let user_service = Arc::new(UserService::new(user_repository.clone()));
        let auth_service = Arc::new(AuthService::new(user_repository.clone(), token_service));
        let job_service = Arc::new(JobService::new(job_repository.clone(), blob_store.clone()));
        let application_service = Arc::new(ApplicationService::new(
            application_repository,
            job_repository,
            user_repository,
            blob_store,
        ));

        AppState {
            user_service,
            auth_service,
            job_service,
            application_service,
            news_repository,
            max_upload_bytes,
            pool,
        }
    }
}
