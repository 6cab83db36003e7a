use anyhow::Result;
use chrono::{Duration, Utc};
use jobboard::{
    db,
    models::user::Role,
    repositories::{SqliteApplicationRepository, SqliteJobRepository, SqliteUserRepository},
    services::{
        application_service::ApplicationServiceError, blob_store::MemoryBlobStore,
        ApplicationService, JobService,
    },
    test_utils::test_helpers,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::task::JoinSet;

fn services(pool: &SqlitePool) -> (Arc<ApplicationService>, Arc<JobService>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let jobs = Arc::new(SqliteJobRepository::new(pool.clone()));
    let applications = ApplicationService::new(
        Arc::new(SqliteApplicationRepository::new(pool.clone())),
        jobs.clone(),
        Arc::new(SqliteUserRepository::new(pool.clone())),
        blobs.clone(),
    );
    (
        Arc::new(applications),
        Arc::new(JobService::new(jobs, blobs)),
    )
}

/// Candidates with a placeholder hash; nobody logs in here.
async fn insert_candidates(pool: &SqlitePool, count: usize) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, role, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(format!("candidate{}@example.com", i))
        .bind("unused")
        .bind(Role::Candidate.as_str())
        .bind(format!("Candidate {}", i))
        .bind(db::format_timestamp(&db::now()))
        .execute(pool)
        .await?;
        ids.push(result.last_insert_rowid());
    }
    Ok(ids)
}

async fn count(pool: &SqlitePool, sql: &str) -> Result<i64> {
    Ok(sqlx::query_scalar(sql).fetch_one(pool).await?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_applications_to_one_job() -> Result<()> {
    let (pool, _file) = test_helpers::create_test_db_file().await?;
    let (applications, _) = services(&pool);
    let job = test_helpers::insert_test_job(&pool, "Backend Engineer", "Acme", None, Utc::now())
        .await?;
    let candidates = insert_candidates(&pool, 40).await?;

    let mut tasks = JoinSet::new();
    for &user_id in &candidates {
        let applications = applications.clone();
        tasks.spawn(async move { applications.apply(job, user_id, None).await });
    }

    while let Some(joined) = tasks.join_next().await {
        let application = joined??;
        assert_eq!(application.job_id, job);
    }

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM applications").await?, 40);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_duplicates_leave_one_application() -> Result<()> {
    let (pool, _file) = test_helpers::create_test_db_file().await?;
    let (applications, _) = services(&pool);
    let job = test_helpers::insert_test_job(&pool, "Backend Engineer", "Acme", None, Utc::now())
        .await?;
    let candidates = insert_candidates(&pool, 10).await?;

    let mut tasks = JoinSet::new();
    for &user_id in &candidates {
        for _ in 0..3 {
            let applications = applications.clone();
            tasks.spawn(async move { applications.apply(job, user_id, None).await });
        }
    }

    let (mut accepted, mut duplicates) = (0, 0);
    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(_) => accepted += 1,
            Err(ApplicationServiceError::Duplicate) => duplicates += 1,
            Err(e) => panic!("unexpected failure: {}", e),
        }
    }

    assert_eq!(accepted, 10);
    assert_eq!(duplicates, 20);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM applications").await?, 10);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_and_applies() -> Result<()> {
    let (pool, _file) = test_helpers::create_test_db_file().await?;
    let (applications, jobs) = services(&pool);
    let candidates = insert_candidates(&pool, 5).await?;
    let base = Utc::now() - Duration::days(1);

    let mut doomed = Vec::new();
    for i in 0..30 {
        let job = test_helpers::insert_test_job(
            &pool,
            &format!("Job {}", i),
            "Acme",
            None,
            base + Duration::minutes(i),
        )
        .await?;
        test_helpers::insert_test_application(&pool, job, candidates[0], None).await?;
        doomed.push(job);
    }
    let kept = test_helpers::insert_test_job(&pool, "Kept", "Acme", None, base).await?;

    let mut deletes = JoinSet::new();
    for &job in &doomed {
        let jobs = jobs.clone();
        deletes.spawn(async move { jobs.delete_job(job).await });
    }
    let mut applies = JoinSet::new();
    for &user_id in &candidates {
        let applications = applications.clone();
        applies.spawn(async move { applications.apply(kept, user_id, None).await });
    }

    while let Some(joined) = deletes.join_next().await {
        joined??;
    }
    while let Some(joined) = applies.join_next().await {
        joined??;
    }

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM jobs").await?, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM applications").await?, 5);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_apply_racing_job_delete_never_orphans() -> Result<()> {
    let (pool, _file) = test_helpers::create_test_db_file().await?;
    let (applications, jobs) = services(&pool);
    let job = test_helpers::insert_test_job(&pool, "Backend Engineer", "Acme", None, Utc::now())
        .await?;
    let candidates = insert_candidates(&pool, 20).await?;

    let mut tasks = JoinSet::new();
    for &user_id in &candidates {
        let applications = applications.clone();
        tasks.spawn(async move { applications.apply(job, user_id, None).await.map(|_| ()) });
    }
    let deleter = {
        let jobs = jobs.clone();
        tokio::spawn(async move { jobs.delete_job(job).await })
    };

    while let Some(joined) = tasks.join_next().await {
        match joined? {
            Ok(()) | Err(ApplicationServiceError::JobNotFound(_)) => {}
            Err(e) => panic!("unexpected failure: {}", e),
        }
    }
    deleter.await??;

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM applications").await?, 0);
    Ok(())
}
