pub mod test_helpers {
    use crate::{
        config::TokenConfig,
        db,
        models::user::Role,
        services::{blob_store::MemoryBlobStore, user_service::hash_password},
        AppState,
    };
    use chrono::{DateTime, Utc};
    use sqlx::{
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
        SqlitePool,
    };
    use std::{str::FromStr, sync::Arc};
    use tempfile::NamedTempFile;

    /// Upload limit used by [`test_state`].
    pub const TEST_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // A single connection that never recycles keeps the in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        // Run migrations
        db::run_migrations(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when several connections must see the same data
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = db::create_pool(&database_url).await?;

        // Run migrations
        db::run_migrations(&pool).await?;

        Ok((pool, temp_file))
    }

    /// Token settings with a fixed secret.
    pub fn test_token_config() -> TokenConfig {
        TokenConfig {
            secret: b"jobboard-test-secret-jobboard-test-secret".to_vec(),
            ttl: chrono::Duration::hours(24),
        }
    }

    /// Application state over `pool` with an in-memory blob store.
    pub fn test_state(pool: SqlitePool) -> (AppState, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let state = AppState::new(
            pool,
            &test_token_config(),
            blobs.clone(),
            TEST_MAX_UPLOAD_BYTES,
        );
        (state, blobs)
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
        role: Role,
        name: &str,
    ) -> Result<i64, sqlx::Error> {
        let password_hash = hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, role, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(name)
        .bind(db::format_timestamp(&db::now()))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert a job with an explicit posting time
    pub async fn insert_test_job(
        pool: &SqlitePool,
        title: &str,
        company: &str,
        category: Option<&str>,
        posted_at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO jobs (title, company, category, posted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(company)
        .bind(category)
        .bind(db::format_timestamp(&posted_at))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert an application row directly, bypassing scoring
    pub async fn insert_test_application(
        pool: &SqlitePool,
        job_id: i64,
        user_id: i64,
        resume_ref: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO applications (job_id, user_id, resume_ref, score, applied_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(job_id)
        .bind(user_id)
        .bind(resume_ref)
        .bind(75_i64)
        .bind(db::format_timestamp(&db::now()))
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
