//! Core data types shared by the scanner, orchestrator and client

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A single commit as reported by the history query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash; the dedup key within one repository
    pub id: String,
    /// Author as `Name <email>`
    pub author: String,
    /// Author date in `YYYY-MM-DD` form (lexically sortable)
    pub date: String,
    /// Commit subject line
    pub message: String,
    /// Branch the commit was attributed to
    pub branch: String,
}

/// Commits collected from one repository, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryResult {
    /// Repository root directory
    pub path: PathBuf,
    /// Deduplicated commits sorted by date descending
    pub commits: Vec<Commit>,
}

/// Parameters for one scan invocation
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory the repository search starts from
    pub root_directory: PathBuf,
    /// Number of directory levels examined below (and including) the root
    pub max_depth: usize,
    /// Directory names containing any of these substrings are not descended into
    pub ignore_patterns: Vec<String>,
    /// How many days of history to collect
    pub days_back: u32,
    /// Upper bound on commits requested from each repository
    pub max_commits_per_repository: usize,
    /// Number of history queries allowed to run at once
    pub concurrency_limit: usize,
    /// Raw author filter token: none, `"me"`, or a literal substring
    pub author_filter: Option<String>,
    /// Wall-clock budget for each batch of history queries
    pub timeout: Duration,
}

impl ScanConfig {
    /// Create a scan config for `root` using the built-in defaults
    pub fn new(root: impl AsRef<Path>) -> Self {
        crate::config::ScanDefaults::default().to_scan_config(root)
    }

    pub fn with_author_filter(mut self, author_filter: Option<String>) -> Self {
        self.author_filter = author_filter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that every numeric limit is positive
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks: [(&str, u128); 5] = [
            ("max_depth", self.max_depth as u128),
            ("days_back", self.days_back as u128),
            (
                "max_commits_per_repository",
                self.max_commits_per_repository as u128,
            ),
            ("concurrency_limit", self.concurrency_limit as u128),
            ("timeout", self.timeout.as_millis()),
        ];

        for (field, value) in checks {
            if value == 0 {
                return Err(ValidationError::ConstraintViolation {
                    field: field.to_string(),
                    constraint: "greater than 0".to_string(),
                    actual: "0".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Outcome of a complete scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Repositories that produced at least one matching commit, in batch order
    pub repositories: Vec<RepositoryResult>,
    /// Number of repository roots discovered under the scan root
    pub repositories_found: usize,
    /// Repositories whose history query failed to spawn or exited non-zero
    pub repositories_failed: usize,
    /// Repositories terminated because their batch ran out of time
    pub repositories_timed_out: usize,
    /// Wall-clock duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl ScanReport {
    /// Total commits across all repositories
    pub fn commit_count(&self) -> usize {
        self.repositories.iter().map(|r| r.commits.len()).sum()
    }

    /// Whether any batch hit its deadline
    pub fn timed_out(&self) -> bool {
        self.repositories_timed_out > 0
    }

    /// Every commit paired with its repository, newest first
    pub fn timeline(&self) -> Vec<(&Path, &Commit)> {
        crate::aggregate::timeline(&self.repositories)
    }
}
