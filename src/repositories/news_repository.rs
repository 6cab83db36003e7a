use super::{RepositoryError, RepositoryResult};
use crate::db;
use crate::models::news::News;
use async_trait::async_trait;
use sqlx::SqlitePool;

const DEFAULT_NEWS_LIMIT: i64 = 20;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait NewsRepository: Send + Sync {
    async fn create(
        &self,
        title: &str,
        content: &str,
        category: Option<String>,
    ) -> RepositoryResult<News>;
    async fn list(&self, limit: Option<i64>) -> RepositoryResult<Vec<News>>;
}

pub struct SqliteNewsRepository {
    pool: SqlitePool,
}

impl SqliteNewsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NewsRepository for SqliteNewsRepository {
    async fn create(
        &self,
        title: &str,
        content: &str,
        category: Option<String>,
    ) -> RepositoryResult<News> {
        let published_at = db::now();
        let result = sqlx::query(
            "INSERT INTO news (title, content, category, published_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(&category)
        .bind(db::format_timestamp(&published_at))
        .execute(&self.pool)
        .await?;

        let news = sqlx::query_as::<_, News>(
            "SELECT id, title, content, category, published_at FROM news WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_optional(&self.pool)
        .await?;

        news.ok_or(RepositoryError::NotFound)
    }

    async fn list(&self, limit: Option<i64>) -> RepositoryResult<Vec<News>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_NEWS_LIMIT);

        let news = sqlx::query_as::<_, News>(
            r#"
            SELECT id, title, content, category, published_at
            FROM news
            ORDER BY published_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(news)
    }
}
