use crate::db;
use crate::models::job::{is_valid_deadline, non_blank, CreateJobRequest, Job, NewJob};
use crate::repositories::{JobFilter, JobRepository, RepositoryError};
use crate::services::blob_store::BlobStore;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error("Missing required fields ({})", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid deadline: {0}")]
    InvalidDeadline(String),
    #[error("Job {0} not found")]
    NotFound(i64),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct JobService {
    repository: Arc<dyn JobRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl JobService {
    pub fn new(repository: Arc<dyn JobRepository>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repository, blobs }
    }

    pub async fn create_job(&self, request: CreateJobRequest) -> Result<Job, JobServiceError> {
        let title = non_blank(request.title);
        let company = non_blank(request.company);

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if company.is_none() {
            missing.push("company");
        }

        let (Some(title), Some(company)) = (title, company) else {
            return Err(JobServiceError::MissingFields(missing));
        };

        let deadline = non_blank(request.deadline);
        if let Some(deadline) = &deadline {
            if !is_valid_deadline(deadline) {
                return Err(JobServiceError::InvalidDeadline(deadline.clone()));
            }
        }

        let job = self
            .repository
            .create(NewJob {
                title,
                company,
                location: non_blank(request.location),
                description: non_blank(request.description),
                requirements: non_blank(request.requirements),
                benefits: non_blank(request.benefits),
                salary: non_blank(request.salary),
                job_type: non_blank(request.job_type),
                category: non_blank(request.category),
                deadline,
                employer_id: request.employer_id,
                posted_at: db::now(),
            })
            .await?;

        info!(job_id = job.id, company = %job.company, "Job posted");
        Ok(job)
    }

    pub async fn get_job(&self, id: i64) -> Result<Job, JobServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(JobServiceError::NotFound(id))
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, JobServiceError> {
        Ok(self.repository.list(filter).await?)
    }

    /// Delete a job with all of its applications, then drop their résumés.
    pub async fn delete_job(&self, id: i64) -> Result<(), JobServiceError> {
        let deleted = match self.repository.delete_cascade(id).await {
            Ok(deleted) => deleted,
            Err(RepositoryError::NotFound) => return Err(JobServiceError::NotFound(id)),
            Err(e) => return Err(JobServiceError::RepositoryError(e)),
        };

        info!(
            job_id = id,
            applications = deleted.applications_removed,
            "Job deleted"
        );

        for reference in &deleted.resume_refs {
            if let Err(e) = self.blobs.delete(reference).await {
                warn!(job_id = id, reference = %reference, "Failed to remove résumé: {}", e);
            }
        }

        Ok(())
    }
}
