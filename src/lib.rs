//! # repo-pulse - Recent commit activity across many repositories
//!
//! Finds every git repository below a directory and gathers each one's recent
//! commits by running `git log` in all of them concurrently.
//!
//! ## Overview
//!
//! A scan walks the directory tree to a bounded depth, skipping ignored
//! directories and never descending into a repository once found. The
//! repositories are then processed in fixed-size batches: every repository in
//! a batch gets its own `git log` process, output is buffered until the
//! process exits, and a per-batch deadline terminates anything still running.
//! Each repository's commits are deduplicated, filtered by author and sorted
//! newest first.
//!
//! Per-repository failures never fail a scan; they simply contribute no
//! commits. Only setup problems (a missing root, or an `"me"` author filter
//! with no git identity configured) are reported as errors.
//!
//! ## Pipeline
//!
//! ```text
//! ScanConfig ─► IdentityResolver ─► RepositoryScanner ─► batches of N
//!                                                          │
//!                          ProcessOrchestrator (git log × N, deadline)
//!                                                          │
//!                            parse ─► dedup ─► filter ─► sort ─► ScanReport
//! ```
//!
//! ## Modules
//!
//! - [`scanner`]: Bounded-depth repository discovery
//! - [`identity`]: Author filters and git identity lookup
//! - [`git`]: History query construction and output parsing
//! - [`orchestrator`]: Concurrent process execution with deadline
//! - [`aggregate`]: Dedup, filtering and ordering of commits
//! - [`client`]: High-level scan API
//! - [`config`]: Configuration file and environment overrides
//! - [`types`]: Shared data types
//! - [`error`]: Error types
//! - [`paths`]: Platform config paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use repo_pulse::{PulseClient, ScanConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let client = PulseClient::new()?;
//!     let request = ScanConfig::new("/home/me/src").with_author_filter(Some("me".into()));
//!     let report = client.scan_blocking(&request)?;
//!
//!     for (repo, commit) in report.timeline() {
//!         println!("{} {} {}", commit.date, repo.display(), commit.message);
//!     }
//!     Ok(())
//! }
//! ```

/// Dedup, author filtering and ordering of parsed commits
pub mod aggregate;

/// High-level client tying discovery and extraction together
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// History query construction and output parsing
pub mod git;

/// Author filter resolution and git identity lookup
pub mod identity;

/// Concurrent history query execution
pub mod orchestrator;

/// Platform-specific config paths
pub mod paths;

/// Repository discovery
pub mod scanner;

/// Shared data types
pub mod types;

pub use client::PulseClient;
pub use error::PulseError;
pub use identity::ResolvedAuthorFilter;
pub use types::{Commit, RepositoryResult, ScanConfig, ScanReport};
