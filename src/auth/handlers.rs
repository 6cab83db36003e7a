use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    handlers::ApiJson,
    models::user::{Role, UserSummary},
    services::{auth_service::LoginRequest, user_service::CreateUserRequest},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserSummary,
}

/// POST /auth/register
///
/// Self-registration is limited to candidates and employers; admins are
/// created with the CLI.
pub async fn register_handler(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<impl IntoResponse> {
    if let Some(role) = form.role.as_deref() {
        if role.parse::<Role>() == Ok(Role::Admin) {
            return Err(AppError::Validation {
                message: "Role must be candidate or employer".to_string(),
                fields: vec!["role".to_string()],
            });
        }
    }

    let user = state
        .user_service
        .create_user(CreateUserRequest {
            email: form.email,
            password: form.password,
            role: form.role,
            name: form.name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserSummary::from(user))))
}

/// POST /auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<Json<LoginResponse>> {
    let (user, issued) = state
        .auth_service
        .authenticate(LoginRequest {
            email: form.email,
            password: form.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: UserSummary::from(user),
    }))
}
