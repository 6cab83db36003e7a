use crate::db;
use crate::models::application::{Application, ApplicationDetail, ApplicationStatus, NewApplication};
use crate::repositories::{ApplicationRepository, JobRepository, RepositoryError, UserRepository};
use crate::services::blob_store::{BlobError, BlobStore};
use crate::services::match_scorer::{self, CandidateProfile};
use crate::services::status_workflow::{self, Transition, WorkflowError};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Résumé file extensions accepted on upload.
pub const ALLOWED_RESUME_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("Job {0} not found")]
    JobNotFound(i64),
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Application {0} not found")]
    NotFound(i64),
    #[error("Already applied to this job")]
    Duplicate,
    #[error("{0}")]
    InvalidResume(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// A résumé file as received from the client.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ResumeUpload {
    /// Lowercased extension, if it is one we accept.
    fn extension(&self) -> Result<String, ApplicationServiceError> {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        if !ALLOWED_RESUME_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApplicationServiceError::InvalidResume(
                "Invalid file type. Only PDF, DOC, DOCX and TXT files are allowed".to_string(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(ApplicationServiceError::InvalidResume(
                "Uploaded résumé is empty".to_string(),
            ));
        }
        Ok(extension)
    }
}

pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    users: Arc<dyn UserRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        users: Arc<dyn UserRepository>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            applications,
            jobs,
            users,
            blobs,
        }
    }

    /// Record an application of `user_id` to `job_id`, scoring it and storing
    /// the résumé if one was uploaded.
    pub async fn apply(
        &self,
        job_id: i64,
        user_id: i64,
        resume: Option<ResumeUpload>,
    ) -> Result<Application, ApplicationServiceError> {
        let job = self
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(ApplicationServiceError::JobNotFound(job_id))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApplicationServiceError::UserNotFound(user_id))?;

        let score = match_scorer::score(&CandidateProfile::from(&user), &job);

        let resume_ref = match resume {
            Some(upload) => {
                let extension = upload.extension()?;
                Some(self.blobs.put(upload.bytes, &extension).await?)
            }
            None => None,
        };

        let result = self
            .applications
            .insert(NewApplication {
                job_id,
                user_id,
                status: ApplicationStatus::default(),
                resume_ref: resume_ref.clone(),
                score: Some(score),
                applied_at: db::now(),
            })
            .await;

        match result {
            Ok(application) => {
                info!(
                    application_id = application.id,
                    job_id,
                    user_id,
                    score,
                    "Application submitted"
                );
                Ok(application)
            }
            Err(e) => {
                if let Some(reference) = &resume_ref {
                    if let Err(blob_err) = self.blobs.delete(reference).await {
                        warn!(reference = %reference, "Failed to discard résumé: {}", blob_err);
                    }
                }
                Err(match e {
                    RepositoryError::AlreadyExists => ApplicationServiceError::Duplicate,
                    RepositoryError::MissingReference("job") => {
                        ApplicationServiceError::JobNotFound(job_id)
                    }
                    RepositoryError::MissingReference(_) => {
                        ApplicationServiceError::UserNotFound(user_id)
                    }
                    other => ApplicationServiceError::RepositoryError(other),
                })
            }
        }
    }

    pub async fn list_applications(
        &self,
        job_id: Option<i64>,
        user_id: Option<i64>,
    ) -> Result<Vec<ApplicationDetail>, ApplicationServiceError> {
        Ok(self.applications.list(job_id, user_id).await?)
    }

    pub async fn get_application(
        &self,
        id: i64,
    ) -> Result<ApplicationDetail, ApplicationServiceError> {
        self.applications
            .find_detail(id)
            .await?
            .ok_or(ApplicationServiceError::NotFound(id))
    }

    /// Move an application to `requested`. Re-applying the current status is a no-op.
    pub async fn set_status(
        &self,
        id: i64,
        requested: &str,
    ) -> Result<ApplicationDetail, ApplicationServiceError> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or(ApplicationServiceError::NotFound(id))?;

        match status_workflow::validate_transition(application.status, requested)? {
            Transition::Unchanged(_) => {}
            Transition::Moved { from, to } => {
                match self.applications.update_status(id, to).await {
                    Ok(()) => {}
                    Err(RepositoryError::NotFound) => {
                        return Err(ApplicationServiceError::NotFound(id))
                    }
                    Err(e) => return Err(e.into()),
                }
                info!(application_id = id, from = %from, to = %to, "Application status changed");
            }
        }

        self.get_application(id).await
    }

    /// Load a stored résumé together with the application that references it.
    pub async fn fetch_resume(
        &self,
        reference: &str,
    ) -> Result<(Application, Vec<u8>), ApplicationServiceError> {
        crate::services::blob_store::validate_reference(reference)?;

        let application = self
            .applications
            .find_by_resume_ref(reference)
            .await?
            .ok_or_else(|| BlobError::NotFound(reference.to_string()))?;

        let bytes = self
            .blobs
            .get(reference)
            .await?
            .ok_or_else(|| BlobError::NotFound(reference.to_string()))?;

        Ok((application, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::Job;
    use crate::models::user::{Role, User};
    use crate::repositories::application_repository::MockApplicationRepository;
    use crate::repositories::job_repository::MockJobRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::services::blob_store::MemoryBlobStore;
    use chrono::Utc;
    use mockall::predicate::*;

    fn job(id: i64, title: &str) -> Job {
        Job {
            id,
            title: title.to_string(),
            company: "Acme".to_string(),
            location: None,
            description: None,
            requirements: None,
            benefits: None,
            salary: None,
            job_type: None,
            category: None,
            deadline: None,
            employer_id: None,
            posted_at: Utc::now(),
            application_count: 0,
        }
    }

    fn candidate(id: i64, name: &str) -> User {
        User {
            id,
            email: "alice@x.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Candidate,
            name: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn stored(new: NewApplication) -> Application {
        Application {
            id: 11,
            job_id: new.job_id,
            user_id: new.user_id,
            status: new.status,
            resume_ref: new.resume_ref,
            score: new.score,
            applied_at: new.applied_at,
        }
    }

    fn jobs_with(job: Job) -> MockJobRepository {
        let mut jobs = MockJobRepository::new();
        jobs.expect_find_by_id().returning(move |_| {
            let job = job.clone();
            Box::pin(async move { Ok(Some(job)) })
        });
        jobs
    }

    fn users_with(user: User) -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(move |_| {
            let user = user.clone();
            Box::pin(async move { Ok(Some(user)) })
        });
        users
    }

    #[tokio::test]
    async fn test_apply_scores_and_starts_applied() {
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_insert()
            .withf(|new| {
                new.status == ApplicationStatus::Applied
                    && new.score == Some(90)
                    && new.resume_ref.is_none()
            })
            .times(1)
            .returning(|new| {
                let application = stored(new);
                Box::pin(async move { Ok(application) })
            });

        let service = ApplicationService::new(
            Arc::new(applications),
            Arc::new(jobs_with(job(1, "Backend Engineer"))),
            Arc::new(users_with(candidate(2, "Alice Backend"))),
            Arc::new(MemoryBlobStore::new()),
        );

        let application = service.apply(1, 2, None).await.unwrap();
        assert_eq!(application.score, Some(90));
        assert_eq!(application.status, ApplicationStatus::Applied);
    }

    #[tokio::test]
    async fn test_apply_to_missing_job() {
        let mut jobs = MockJobRepository::new();
        jobs.expect_find_by_id()
            .with(eq(404))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let service = ApplicationService::new(
            Arc::new(MockApplicationRepository::new()),
            Arc::new(jobs),
            Arc::new(MockUserRepository::new()),
            Arc::new(MemoryBlobStore::new()),
        );

        assert!(matches!(
            service.apply(404, 2, None).await,
            Err(ApplicationServiceError::JobNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_apply_stores_only_reference() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_insert()
            .withf(|new| {
                new.resume_ref
                    .as_deref()
                    .map(|r| r.ends_with(".pdf"))
                    .unwrap_or(false)
            })
            .times(1)
            .returning(|new| {
                let application = stored(new);
                Box::pin(async move { Ok(application) })
            });

        let service = ApplicationService::new(
            Arc::new(applications),
            Arc::new(jobs_with(job(1, "Designer"))),
            Arc::new(users_with(candidate(2, "Alice"))),
            blobs.clone(),
        );

        let application = service
            .apply(
                1,
                2,
                Some(ResumeUpload {
                    file_name: "CV.PDF".to_string(),
                    bytes: b"%PDF".to_vec(),
                }),
            )
            .await
            .unwrap();

        let reference = application.resume_ref.unwrap();
        assert_eq!(blobs.get(&reference).await.unwrap(), Some(b"%PDF".to_vec()));
        assert_eq!(application.score, Some(75));
    }

    #[tokio::test]
    async fn test_rejected_insert_discards_resume() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_insert()
            .times(1)
            .returning(|_| Box::pin(async move { Err(RepositoryError::MissingReference("job")) }));

        let service = ApplicationService::new(
            Arc::new(applications),
            Arc::new(jobs_with(job(1, "Designer"))),
            Arc::new(users_with(candidate(2, "Alice"))),
            blobs.clone(),
        );

        let result = service
            .apply(
                1,
                2,
                Some(ResumeUpload {
                    file_name: "cv.txt".to_string(),
                    bytes: b"hello".to_vec(),
                }),
            )
            .await;

        assert!(matches!(result, Err(ApplicationServiceError::JobNotFound(1))));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_resume_rejected_before_storage() {
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = ApplicationService::new(
            Arc::new(MockApplicationRepository::new()),
            Arc::new(jobs_with(job(1, "Designer"))),
            Arc::new(users_with(candidate(2, "Alice"))),
            blobs.clone(),
        );

        let result = service
            .apply(
                1,
                2,
                Some(ResumeUpload {
                    file_name: "payload.exe".to_string(),
                    bytes: vec![1],
                }),
            )
            .await;

        assert!(matches!(result, Err(ApplicationServiceError::InvalidResume(_))));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_application() {
        let mut applications = MockApplicationRepository::new();
        applications
            .expect_insert()
            .returning(|_| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let service = ApplicationService::new(
            Arc::new(applications),
            Arc::new(jobs_with(job(1, "Designer"))),
            Arc::new(users_with(candidate(2, "Alice"))),
            Arc::new(MemoryBlobStore::new()),
        );

        assert!(matches!(
            service.apply(1, 2, None).await,
            Err(ApplicationServiceError::Duplicate)
        ));
    }

    #[tokio::test]
    async fn test_set_status_same_value_skips_update() {
        let mut applications = MockApplicationRepository::new();
        applications.expect_find_by_id().returning(|id| {
            let application = Application {
                id,
                job_id: 1,
                user_id: 2,
                status: ApplicationStatus::Offer,
                resume_ref: None,
                score: Some(75),
                applied_at: Utc::now(),
            };
            Box::pin(async move { Ok(Some(application)) })
        });
        applications.expect_update_status().never();
        applications.expect_find_detail().returning(|id| {
            let detail = ApplicationDetail {
                id,
                job_id: 1,
                user_id: 2,
                status: ApplicationStatus::Offer,
                resume_ref: None,
                score: Some(75),
                applied_at: Utc::now(),
                candidate_name: "Alice".to_string(),
                candidate_email: "alice@x.com".to_string(),
                job_title: "Designer".to_string(),
                company: "Acme".to_string(),
            };
            Box::pin(async move { Ok(Some(detail)) })
        });

        let service = ApplicationService::new(
            Arc::new(applications),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(MemoryBlobStore::new()),
        );

        let detail = service.set_status(3, "offer").await.unwrap();
        assert_eq!(detail.status, ApplicationStatus::Offer);
    }

    #[tokio::test]
    async fn test_set_status_unknown_value() {
        let mut applications = MockApplicationRepository::new();
        applications.expect_find_by_id().returning(|id| {
            let application = Application {
                id,
                job_id: 1,
                user_id: 2,
                status: ApplicationStatus::Applied,
                resume_ref: None,
                score: None,
                applied_at: Utc::now(),
            };
            Box::pin(async move { Ok(Some(application)) })
        });
        applications.expect_update_status().never();

        let service = ApplicationService::new(
            Arc::new(applications),
            Arc::new(MockJobRepository::new()),
            Arc::new(MockUserRepository::new()),
            Arc::new(MemoryBlobStore::new()),
        );

        assert!(matches!(
            service.set_status(3, "not-a-state").await,
            Err(ApplicationServiceError::Workflow(WorkflowError::UnknownStatus(_)))
        ));
    }
}
