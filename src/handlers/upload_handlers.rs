use axum::{extract::State, http::header, response::IntoResponse};

use super::{application_handlers::ensure_can_view, extract::ApiPath};
use crate::{auth::AuthUser, error::Result, AppState};

/// GET /uploads/{reference} - stream a stored résumé
pub async fn get_upload_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(reference): ApiPath<String>,
) -> Result<impl IntoResponse> {
    let (application, bytes) = state.application_service.fetch_resume(&reference).await?;
    ensure_can_view(&user, application.user_id)?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&reference)),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        bytes,
    ))
}

fn content_type_for(reference: &str) -> &'static str {
    match reference.rsplit('.').next().unwrap_or("") {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
