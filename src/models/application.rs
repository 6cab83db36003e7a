use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// Lifecycle states of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Screening,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Screening,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Screening => "screening",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Offer => "offer",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Offer | ApplicationStatus::Rejected)
    }

    /// Next state on the happy path, if any.
    pub fn next(&self) -> Option<ApplicationStatus> {
        match self {
            ApplicationStatus::Applied => Some(ApplicationStatus::Screening),
            ApplicationStatus::Screening => Some(ApplicationStatus::Interview),
            ApplicationStatus::Interview => Some(ApplicationStatus::Offer),
            ApplicationStatus::Offer | ApplicationStatus::Rejected => None,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub resume_ref: Option<String>,
    pub score: Option<i64>,
    pub applied_at: DateTime<Utc>,
}

/// Application joined with the candidate and job it links.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ApplicationDetail {
    pub id: i64,
    pub job_id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub resume_ref: Option<String>,
    pub score: Option<i64>,
    pub applied_at: DateTime<Utc>,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_title: String,
    pub company: String,
}

/// Values for a new ledger row.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: i64,
    pub user_id: i64,
    pub status: ApplicationStatus,
    pub resume_ref: Option<String>,
    pub score: Option<i64>,
    pub applied_at: DateTime<Utc>,
}
