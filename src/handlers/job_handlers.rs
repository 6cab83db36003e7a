use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::debug;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    auth::{AuthUser, MaybeAuthUser},
    error::{AppError, Result},
    models::job::{CreateJobRequest, Job},
    repositories::JobFilter,
    services::application_service::ResumeUpload,
    AppState,
};

/// Multipart field carrying the résumé file.
pub const RESUME_FIELD: &str = "resume";

/// GET /jobs - list jobs matching the query criteria, most recent first
pub async fn list_jobs_handler(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<JobFilter>,
) -> Result<Json<Vec<Job>>> {
    let jobs = state.job_service.list_jobs(&filter).await?;
    Ok(Json(jobs))
}

/// POST /jobs
///
/// Open to anonymous callers. When the caller presents a valid token of an
/// employer or admin, the job records them as its owner.
pub async fn create_job_handler(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    ApiJson(mut request): ApiJson<CreateJobRequest>,
) -> Result<impl IntoResponse> {
    request.employer_id = caller
        .filter(|user| user.role.is_privileged())
        .map(|user| user.id);

    let job = state.job_service.create_job(request).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /jobs/{id}
pub async fn get_job_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Job>> {
    Ok(Json(state.job_service.get_job(id).await?))
}

/// DELETE /jobs/{id} - removes the job together with its applications
pub async fn delete_job_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    state.job_service.delete_job(id).await?;
    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

/// POST /jobs/{id}/apply
///
/// The body is optional. A `multipart/form-data` body may carry the résumé
/// in the `resume` field; any other body is ignored.
pub async fn apply_handler(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<i64>,
    AuthUser(user): AuthUser,
    request: Request,
) -> Result<impl IntoResponse> {
    let resume = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        read_resume(multipart, state.max_upload_bytes).await?
    } else {
        None
    };

    let application = state
        .application_service
        .apply(job_id, user.id, resume)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Application submitted successfully",
            "application_id": application.id,
            "score": application.score,
            "status": application.status,
        })),
    ))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_resume(mut multipart: Multipart, max_bytes: usize) -> Result<Option<ResumeUpload>> {
    let mut resume = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != RESUME_FIELD {
            debug!(field = %name, "Skipping multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read résumé: {}", e)))?;

        // Browsers submit an empty part when no file was chosen
        if bytes.is_empty() && file_name.is_empty() {
            continue;
        }

        if bytes.len() > max_bytes {
            return Err(AppError::Validation {
                message: format!("File too large. Maximum size is {} bytes", max_bytes),
                fields: vec![RESUME_FIELD.to_string()],
            });
        }

        resume = Some(ResumeUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Ok(resume)
}
