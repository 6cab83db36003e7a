use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::{application::ApplicationDetail, user::User},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationQuery {
    pub job_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// Kept loose so that a non-string status is reported as an invalid
    /// transition rather than a malformed body.
    #[serde(default)]
    pub status: Option<Value>,
}

/// GET /applications
///
/// Candidates only see their own applications. Employers and admins see
/// all of them, optionally narrowed by `job_id` and `user_id`.
pub async fn list_applications_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<ApplicationQuery>,
) -> Result<Json<Vec<ApplicationDetail>>> {
    let user_id = if user.role.is_privileged() {
        query.user_id
    } else {
        Some(user.id)
    };

    let applications = state
        .application_service
        .list_applications(query.job_id, user_id)
        .await?;

    Ok(Json(applications))
}

/// GET /applications/{id}
pub async fn get_application_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApplicationDetail>> {
    let application = state.application_service.get_application(id).await?;
    ensure_can_view(&user, application.user_id)?;
    Ok(Json(application))
}

/// PATCH /applications/{id}/status
pub async fn update_status_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<ApplicationDetail>> {
    if !user.role.is_privileged() {
        return Err(AppError::Forbidden(
            "only employers and admins may change application status".to_string(),
        ));
    }

    let status = match update.status {
        None | Some(Value::Null) => return Err(AppError::missing_fields(&["status"])),
        Some(Value::String(status)) => status,
        Some(other) => return Err(AppError::InvalidTransition(other.to_string())),
    };

    let application = state.application_service.set_status(id, &status).await?;
    Ok(Json(application))
}

/// Owners, employers and admins may read an application.
pub(crate) fn ensure_can_view(user: &User, owner_id: i64) -> Result<()> {
    if user.role.is_privileged() || user.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "application belongs to another candidate".to_string(),
        ))
    }
}
