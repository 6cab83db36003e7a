use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub employer_id: Option<i64>,
    pub posted_at: DateTime<Utc>,
    pub application_count: i64,
}

/// Attributes accepted when publishing a job.
///
/// `title` and `company` are optional at the serde level so that a missing
/// field surfaces as a validation error naming the field instead of a
/// generic deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateJobRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default, alias = "jobType", alias = "type")]
    pub job_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(skip)]
    pub employer_id: Option<i64>,
}

/// Validated job attributes ready for insertion.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub employer_id: Option<i64>,
    pub posted_at: DateTime<Utc>,
}

/// Trim and drop empty optional text.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deadlines are accepted as RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
pub fn is_valid_deadline(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
