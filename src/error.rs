use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::{
    application_service::ApplicationServiceError, auth_service::AuthServiceError,
    blob_store::BlobError, job_service::JobServiceError, status_workflow::WorkflowError,
    token_service::TokenError, user_service::UserServiceError,
};

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error returned by every HTTP handler.
///
/// Each variant maps to a stable machine-readable kind (see [`AppError::kind`])
/// and an HTTP status. Storage details are logged, never sent to the caller.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<String>,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Email already registered")]
    DuplicateIdentity,

    #[error("Already applied to this job")]
    DuplicateApplication,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authorization header is required")]
    MissingToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid status: {0}")]
    InvalidTransition(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn missing_fields(fields: &[&str]) -> Self {
        AppError::Validation {
            message: format!("Missing required fields ({})", fields.join(", ")),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::DuplicateIdentity => "duplicate_identity",
            AppError::DuplicateApplication => "duplicate_application",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::MissingToken => "missing_token",
            AppError::ExpiredToken => "expired_token",
            AppError::InvalidSignature => "invalid_signature",
            AppError::Forbidden(_) => "forbidden",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::Storage(_) | AppError::Database(_) => "storage_failure",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::DuplicateIdentity
            | AppError::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateApplication => StatusCode::CONFLICT,
            AppError::InvalidCredentials
            | AppError::MissingToken
            | AppError::ExpiredToken
            | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Storage(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Only storage failures may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Database(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let body = match &self {
            AppError::Storage(_) | AppError::Database(_) => {
                tracing::error!("Request failed with storage error: {}", self);
                json!({
                    "error": kind,
                    "message": "Internal server error",
                    "retryable": true,
                })
            }
            AppError::Validation { message, fields } if !fields.is_empty() => json!({
                "error": kind,
                "message": message,
                "fields": fields,
            }),
            AppError::Validation { message, .. } => json!({
                "error": kind,
                "message": message,
            }),
            other => json!({
                "error": kind,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

// Conversion traits

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AppError::NotFound("Record".to_string()),
            RepositoryError::AlreadyExists => AppError::validation("Record already exists"),
            RepositoryError::MissingReference(entity) => AppError::NotFound(entity.to_string()),
            RepositoryError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::ExpiredToken,
            TokenError::InvalidSignature => AppError::InvalidSignature,
            TokenError::Encoding(msg) => AppError::Storage(msg),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidEmail => AppError::Validation {
                message: err.to_string(),
                fields: vec!["email".to_string()],
            },
            UserServiceError::EmptyPassword => AppError::Validation {
                message: err.to_string(),
                fields: vec!["password".to_string()],
            },
            UserServiceError::InvalidRole(_) => AppError::Validation {
                message: err.to_string(),
                fields: vec!["role".to_string()],
            },
            UserServiceError::EmailTaken => AppError::DuplicateIdentity,
            UserServiceError::UserNotFound => AppError::NotFound("User".to_string()),
            UserServiceError::HashingError(msg) => AppError::Storage(msg),
            UserServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials | AuthServiceError::UserNotFound => {
                AppError::InvalidCredentials
            }
            AuthServiceError::Token(e) => e.into(),
            AuthServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<JobServiceError> for AppError {
    fn from(err: JobServiceError) -> Self {
        match err {
            JobServiceError::MissingFields(fields) => AppError::missing_fields(&fields),
            JobServiceError::InvalidDeadline(_) => AppError::Validation {
                message: err.to_string(),
                fields: vec!["deadline".to_string()],
            },
            JobServiceError::NotFound(_) => AppError::NotFound("Job".to_string()),
            JobServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::UnknownStatus(status) => AppError::InvalidTransition(status),
        }
    }
}

impl From<BlobError> for AppError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::InvalidReference(_) | BlobError::NotFound(_) => {
                AppError::NotFound("Upload".to_string())
            }
            BlobError::Io(e) => AppError::Storage(e.to_string()),
            BlobError::Poisoned => AppError::Storage("blob store lock poisoned".to_string()),
        }
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(err: ApplicationServiceError) -> Self {
        match err {
            ApplicationServiceError::JobNotFound(_) => AppError::NotFound("Job".to_string()),
            ApplicationServiceError::UserNotFound(_) => AppError::NotFound("User".to_string()),
            ApplicationServiceError::NotFound(_) => AppError::NotFound("Application".to_string()),
            ApplicationServiceError::Duplicate => AppError::DuplicateApplication,
            ApplicationServiceError::InvalidResume(msg) => AppError::Validation {
                message: msg,
                fields: vec!["resume".to_string()],
            },
            ApplicationServiceError::Workflow(e) => e.into(),
            ApplicationServiceError::Blob(e) => e.into(),
            ApplicationServiceError::RepositoryError(e) => e.into(),
        }
    }
}
