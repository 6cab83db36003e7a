//! Deterministic candidate-to-job compatibility heuristic.
//!
//! Not a learned model: the score depends only on the candidate's display
//! name and the job title, so identical inputs always give the same result.

use crate::models::job::Job;
use crate::models::user::User;

pub const BASE_SCORE: i64 = 75;
pub const NAME_MATCH_BONUS: i64 = 15;
pub const SCORE_CEILING: i64 = 99;

/// What the scorer knows about a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateProfile {
    pub name: String,
}

impl From<&User> for CandidateProfile {
    fn from(user: &User) -> Self {
        CandidateProfile {
            name: user.name.clone(),
        }
    }
}

pub fn score(candidate: &CandidateProfile, job: &Job) -> i64 {
    score_title(&candidate.name, &job.title)
}

/// Base score, plus a bonus when any whitespace-separated token of `name`
/// occurs in `title` ignoring case. Capped at [`SCORE_CEILING`].
pub fn score_title(name: &str, title: &str) -> i64 {
    let title = title.to_lowercase();
    let matched = name
        .split_whitespace()
        .any(|token| title.contains(&token.to_lowercase()));

    let bonus = if matched { NAME_MATCH_BONUS } else { 0 };
    (BASE_SCORE + bonus).min(SCORE_CEILING)
}
