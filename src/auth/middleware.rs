use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::{error::AppError, models::user::User, AppState};

/// The caller identified by a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Caller identity on routes where authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<User>);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::MissingToken)?
        .to_str()
        .map_err(|_| AppError::InvalidSignature)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AppError::InvalidSignature)?;

    if token.is_empty() {
        return Err(AppError::MissingToken);
    }

    Ok(token)
}

async fn identify(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = extract_bearer_token(headers)?;
    state.auth_service.identify(token).await.map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        AppError::from(e)
    })
}

/// Reject requests without a valid bearer token; otherwise make the caller
/// available to handlers as an [`AuthUser`] extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = identify(&state, request.headers()).await?;
    debug!(user_id = user.id, role = %user.role, "Authenticated request");

    request.extensions_mut().insert(AuthUser(user));
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        identify(state, &parts.headers).await.map(AuthUser)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Infallible> {
        if let Some(AuthUser(user)) = parts.extensions.get::<AuthUser>() {
            return Ok(MaybeAuthUser(Some(user.clone())));
        }
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        match identify(state, &parts.headers).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(e) => {
                debug!("Ignoring unusable bearer token on public route: {}", e);
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
