use super::{RepositoryError, RepositoryResult};
use crate::db;
use crate::models::application::{
    Application, ApplicationDetail, ApplicationStatus, NewApplication,
};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const APPLICATION_COLUMNS: &str = "id, job_id, user_id, status, resume_ref, score, applied_at";

const DETAIL_SELECT: &str = r#"
    SELECT
        a.id, a.job_id, a.user_id, a.status, a.resume_ref, a.score, a.applied_at,
        u.name AS candidate_name,
        u.email AS candidate_email,
        j.title AS job_title,
        j.company AS company
    FROM applications a
    JOIN users u ON u.id = a.user_id
    JOIN jobs j ON j.id = a.job_id
"#;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ApplicationRepository: Send + Sync {
    /// Insert a new application. Fails with `MissingReference` when the job or
    /// user is gone at insert time and `AlreadyExists` on a duplicate pair.
    async fn insert(&self, application: NewApplication) -> RepositoryResult<Application>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Application>>;
    async fn find_detail(&self, id: i64) -> RepositoryResult<Option<ApplicationDetail>>;
    async fn find_by_resume_ref(&self, resume_ref: &str) -> RepositoryResult<Option<Application>>;
    async fn list(
        &self,
        job_id: Option<i64>,
        user_id: Option<i64>,
    ) -> RepositoryResult<Vec<ApplicationDetail>>;
    async fn update_status(&self, id: i64, status: ApplicationStatus) -> RepositoryResult<()>;
}

pub struct SqliteApplicationRepository {
    pool: SqlitePool,
}

impl SqliteApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for SqliteApplicationRepository {
    async fn insert(&self, application: NewApplication) -> RepositoryResult<Application> {
        // Take the write lock up front; a deferred transaction that reads
        // first cannot upgrade while another writer holds the database.
        let mut tx = self.pool.begin_with(db::BEGIN_IMMEDIATE).await?;

        // Re-check references inside the transaction so a concurrently
        // deleted job is rejected rather than silently orphaned.
        let job_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = ?")
            .bind(application.job_id)
            .fetch_optional(&mut *tx)
            .await?;
        if job_exists.is_none() {
            return Err(RepositoryError::MissingReference("job"));
        }

        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(application.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Err(RepositoryError::MissingReference("user"));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO applications (job_id, user_id, status, resume_ref, score, applied_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(application.job_id)
        .bind(application.user_id)
        .bind(application.status.as_str())
        .bind(&application.resume_ref)
        .bind(application.score)
        .bind(db::format_timestamp(&application.applied_at))
        .execute(&mut *tx)
        .await;

        let id = match result {
            Ok(res) => res.last_insert_rowid(),
            Err(e) if db::is_unique_violation(&e) => return Err(RepositoryError::AlreadyExists),
            Err(e) => return Err(RepositoryError::Database(e)),
        };

        let inserted = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn find_detail(&self, id: i64) -> RepositoryResult<Option<ApplicationDetail>> {
        let detail = sqlx::query_as::<_, ApplicationDetail>(&format!("{DETAIL_SELECT} WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(detail)
    }

    async fn find_by_resume_ref(&self, resume_ref: &str) -> RepositoryResult<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE resume_ref = ?"
        ))
        .bind(resume_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn list(
        &self,
        job_id: Option<i64>,
        user_id: Option<i64>,
    ) -> RepositoryResult<Vec<ApplicationDetail>> {
        let mut qb = QueryBuilder::<Sqlite>::new(DETAIL_SELECT);
        let mut first = true;

        if let Some(job_id) = job_id {
            qb.push(if first { " WHERE " } else { " AND " });
            qb.push("a.job_id = ").push_bind(job_id);
            first = false;
        }

        if let Some(user_id) = user_id {
            qb.push(if first { " WHERE " } else { " AND " });
            qb.push("a.user_id = ").push_bind(user_id);
        }

        qb.push(" ORDER BY a.applied_at DESC, a.id DESC");

        let rows = qb
            .build_query_as::<ApplicationDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn update_status(&self, id: i64, status: ApplicationStatus) -> RepositoryResult<()> {
        let result = sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
