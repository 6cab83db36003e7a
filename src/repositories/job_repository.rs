use super::{JobFilter, RepositoryError, RepositoryResult};
use crate::db;
use crate::models::job::{Job, NewJob};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const JOB_SELECT: &str = r#"
    SELECT
        j.id, j.title, j.company, j.location, j.description, j.requirements,
        j.benefits, j.salary, j.job_type, j.category, j.deadline, j.employer_id,
        j.posted_at,
        (SELECT COUNT(*) FROM applications a WHERE a.job_id = j.id) AS application_count
    FROM jobs j
"#;

/// What a cascading delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedJob {
    pub applications_removed: u64,
    /// Résumé references held by the removed applications.
    pub resume_refs: Vec<String>,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: NewJob) -> RepositoryResult<Job>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Job>>;
    async fn list(&self, filter: &JobFilter) -> RepositoryResult<Vec<Job>>;
    /// Delete the job and all of its applications in one transaction.
    async fn delete_cascade(&self, id: i64) -> RepositoryResult<DeletedJob>;
}

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn create(&self, job: NewJob) -> RepositoryResult<Job> {
        let result = sqlx::query(
            r#"
            INSERT INTO jobs (
                title, company, location, description, requirements, benefits,
                salary, job_type, category, deadline, employer_id, posted_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.location)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.benefits)
        .bind(&job.salary)
        .bind(&job.job_type)
        .bind(&job.category)
        .bind(&job.deadline)
        .bind(job.employer_id)
        .bind(db::format_timestamp(&job.posted_at))
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!("{JOB_SELECT} WHERE j.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn list(&self, filter: &JobFilter) -> RepositoryResult<Vec<Job>> {
        let filter = filter.clone().normalized();

        let mut qb = QueryBuilder::<Sqlite>::new(JOB_SELECT);
        filter.push_predicates(&mut qb);
        qb.push(" ORDER BY j.posted_at DESC, j.id DESC");

        if !filter.has_text_criteria() {
            filter.push_paging(&mut qb);
            let jobs = qb.build_query_as::<Job>().fetch_all(&self.pool).await?;
            return Ok(jobs);
        }

        // Substring criteria fold case in Rust, so paging has to follow them.
        let jobs = qb.build_query_as::<Job>().fetch_all(&self.pool).await?;
        Ok(filter.apply_text_criteria(jobs))
    }

    async fn delete_cascade(&self, id: i64) -> RepositoryResult<DeletedJob> {
        let mut tx = self.pool.begin_with(db::BEGIN_IMMEDIATE).await?;

        let resume_refs: Vec<String> = sqlx::query_scalar(
            "SELECT resume_ref FROM applications WHERE job_id = ? AND resume_ref IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let applications = sqlx::query("DELETE FROM applications WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let job = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if job.rows_affected() == 0 {
            // Dropping the transaction rolls back the application deletes.
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        Ok(DeletedJob {
            applications_removed: applications.rows_affected(),
            resume_refs,
        })
    }
}
