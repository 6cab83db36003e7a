use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::extract::{ApiJson, ApiQuery};
use crate::{
    auth::AuthUser,
    error::{AppError, Result},
    models::{
        job::non_blank,
        news::{CreateNewsRequest, News},
        user::Role,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub limit: Option<i64>,
}

/// GET /news - latest announcements first
pub async fn list_news_handler(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NewsQuery>,
) -> Result<Json<Vec<News>>> {
    Ok(Json(state.news_repository.list(query.limit).await?))
}

/// POST /news - admin only
pub async fn create_news_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateNewsRequest>,
) -> Result<impl IntoResponse> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden("only admins may publish news".to_string()));
    }

    let title = non_blank(request.title);
    let content = non_blank(request.content);
    let (Some(title), Some(content)) = (&title, &content) else {
        let missing: Vec<&str> = [("title", &title), ("content", &content)]
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(field, _)| field)
            .collect();
        return Err(AppError::missing_fields(&missing));
    };

    let news = state
        .news_repository
        .create(title, content, non_blank(request.category))
        .await?;

    info!(news_id = news.id, "News published");
    Ok((StatusCode::CREATED, Json(news)))
}
