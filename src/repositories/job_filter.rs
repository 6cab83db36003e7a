//! Translation of optional listing criteria into a query over `jobs`.
//!
//! Every provided criterion narrows the result (logical AND across
//! criteria); `search` is an OR across title, company, description and
//! requirements. The exact criteria become a SQL predicate. The substring
//! criteria are matched in Rust after Unicode case folding, since sqlite's
//! `lower()` folds ASCII only; plain `str::contains` also keeps `%` and `_`
//! in caller input literal.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::job::Job;

/// Upper bound on a single page of results.
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobFilter {
    /// Exact match.
    #[serde(default)]
    pub category: Option<String>,
    /// Exact match.
    #[serde(default, alias = "jobType", alias = "type")]
    pub job_type: Option<String>,
    /// Case-insensitive substring.
    #[serde(default)]
    pub location: Option<String>,
    /// Case-insensitive substring of title, company, description or requirements.
    #[serde(default, alias = "searchText", alias = "q")]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl JobFilter {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Blank criteria impose no constraint.
    pub fn normalized(self) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        JobFilter {
            category: present(self.category),
            job_type: present(self.job_type),
            location: present(self.location),
            search: present(self.search),
            limit: self
                .limit
                .filter(|limit| *limit > 0)
                .map(|limit| limit.min(MAX_PAGE_SIZE)),
            offset: self.offset.filter(|offset| *offset > 0),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.category.is_none()
            && self.job_type.is_none()
            && !self.has_text_criteria()
    }

    /// Whether `location` or `search` is set, which are matched outside SQL.
    pub fn has_text_criteria(&self) -> bool {
        self.location.is_some() || self.search.is_some()
    }

    /// Append the WHERE clause for the exact criteria. Expects a normalized
    /// filter and a query that selects from `jobs` aliased as `j`.
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let mut first = true;

        if let Some(category) = &self.category {
            push_conjunction(qb, &mut first);
            qb.push("j.category = ").push_bind(category.clone());
        }

        if let Some(job_type) = &self.job_type {
            push_conjunction(qb, &mut first);
            qb.push("j.job_type = ").push_bind(job_type.clone());
        }
    }

    /// Append LIMIT/OFFSET. Must come after ORDER BY, and only when there
    /// are no text criteria left to apply.
    pub fn push_paging(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                qb.push(" LIMIT ").push_bind(limit);
                if let Some(offset) = offset {
                    qb.push(" OFFSET ").push_bind(offset);
                }
            }
            // sqlite only accepts OFFSET after a LIMIT; -1 means unbounded.
            (None, Some(offset)) => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(offset);
            }
            (None, None) => {}
        }
    }

    /// Whether `job` satisfies the `location` and `search` criteria.
    pub fn matches_text(&self, job: &Job) -> bool {
        if let Some(location) = &self.location {
            if !contains_folded(job.location.as_deref().unwrap_or(""), location) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let haystacks = [
                Some(job.title.as_str()),
                Some(job.company.as_str()),
                job.description.as_deref(),
                job.requirements.as_deref(),
            ];
            if !haystacks
                .into_iter()
                .flatten()
                .any(|text| contains_folded(text, search))
            {
                return false;
            }
        }

        true
    }

    /// Keep the jobs passing the text criteria, then page. `jobs` must
    /// already be in listing order.
    pub fn apply_text_criteria(&self, jobs: Vec<Job>) -> Vec<Job> {
        let offset = self.offset.unwrap_or(0) as usize;
        let limit = self.limit.map_or(usize::MAX, |limit| limit as usize);

        jobs.into_iter()
            .filter(|job| self.matches_text(job))
            .skip(offset)
            .take(limit)
            .collect()
    }
}

fn push_conjunction(qb: &mut QueryBuilder<'_, Sqlite>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

/// Case-insensitive substring test over full Unicode case folding.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
