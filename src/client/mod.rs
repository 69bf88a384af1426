//! Core library client for repo-pulse
//!
//! Ties the pipeline together: validate the request, resolve the author
//! filter, discover repositories, run their history queries in bounded
//! batches and assemble the report.

use crate::config::Config;
use crate::error::{PulseError, ScanError, ValidationError};
use crate::git::{GitLogCommand, HistoryCommand};
use crate::identity::IdentityResolver;
use crate::orchestrator::ProcessOrchestrator;
use crate::scanner::RepositoryScanner;
use crate::types::{ScanConfig, ScanReport};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Main client for scanning a directory tree for recent commits
///
/// # Example
///
/// ```no_run
/// use repo_pulse::PulseClient;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = PulseClient::new()?;
///     let request = client.scan_config("/home/me/src");
///     let report = client.scan(&request).await?;
///
///     for repo in &report.repositories {
///         println!("{}: {} commits", repo.path.display(), repo.commits.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct PulseClient {
    pub(crate) config: Arc<Config>,
    pub(crate) identity: Arc<IdentityResolver>,
    // Replaces the git log query when set
    pub(crate) history_command: Option<Arc<dyn HistoryCommand>>,
}

impl PulseClient {
    /// Create a client from the config file and environment
    pub fn new() -> Result<Self, PulseError> {
        Ok(Self::with_config(Config::new()?))
    }

    /// Create a client with an explicit configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            identity: Arc::new(IdentityResolver::git()),
            history_command: None,
        }
    }

    /// Use a different identity resolver
    pub fn with_identity_resolver(mut self, resolver: IdentityResolver) -> Self {
        self.identity = Arc::new(resolver);
        self
    }

    /// Run `command` instead of `git log` in each repository
    pub fn with_history_command(mut self, command: Arc<dyn HistoryCommand>) -> Self {
        self.history_command = Some(command);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A scan request for `root` built from the configured defaults
    pub fn scan_config(&self, root: impl AsRef<Path>) -> ScanConfig {
        self.config.scan.to_scan_config(root)
    }

    /// Drop the cached git identity so the next `"me"` filter re-reads it
    pub async fn refresh_identity(&self) {
        self.identity.invalidate().await;
    }

    /// Scan `request.root_directory` and collect recent commits
    pub async fn scan(&self, request: &ScanConfig) -> Result<ScanReport, PulseError> {
        self.scan_cancellable(request, CancellationToken::new()).await
    }

    /// Like [`scan`](Self::scan), but `cancel` terminates any running history
    /// queries and skips remaining batches; completed results are kept
    pub async fn scan_cancellable(
        &self,
        request: &ScanConfig,
        cancel: CancellationToken,
    ) -> Result<ScanReport, PulseError> {
        let start_time = Instant::now();

        request.validate()?;
        check_root(&request.root_directory)?;

        // Resolved before anything is spawned: an unusable filter aborts the scan.
        // Repository-scope identity comes from the scan root.
        let filter = self
            .identity
            .resolve_in(
                request.author_filter.as_deref(),
                Some(&request.root_directory),
            )
            .await?;

        tracing::info!(
            "Scanning {} (depth {}, {} days, {})",
            request.root_directory.display(),
            request.max_depth,
            request.days_back,
            filter
        );

        let scanner = RepositoryScanner::new(&request.root_directory, request.max_depth)
            .with_ignore_patterns(request.ignore_patterns.clone());
        let repositories = tokio::task::spawn_blocking(move || scanner.scan())
            .await
            .map_err(|e| ScanError::TaskFailed(e.to_string()))?;

        let command: Arc<dyn HistoryCommand> = match &self.history_command {
            Some(command) => command.clone(),
            None => Arc::new(GitLogCommand::for_days_back(
                request.days_back,
                request.max_commits_per_repository,
            )),
        };

        let outcome = ProcessOrchestrator::new(command)
            .with_timeout(request.timeout)
            .with_cancellation(cancel)
            .run_batched(&repositories, request.concurrency_limit, &filter)
            .await;

        let report = ScanReport {
            repositories: outcome.results,
            repositories_found: repositories.len(),
            repositories_failed: outcome.failed,
            repositories_timed_out: outcome.timed_out,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Scan complete: {} commits from {} of {} repositories in {}ms",
            report.commit_count(),
            report.repositories.len(),
            report.repositories_found,
            report.duration_ms
        );
        Ok(report)
    }

    /// Blocking form of [`scan`](Self::scan) for synchronous callers
    ///
    /// Must not be called from inside an async runtime.
    pub fn scan_blocking(&self, request: &ScanConfig) -> Result<ScanReport, PulseError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ScanError::RuntimeFailed(
                "blocking scan called from within an async runtime".to_string(),
            )
            .into());
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ScanError::RuntimeFailed(e.to_string()))?;

        runtime.block_on(self.scan(request))
    }
}

/// The scan root must be an existing, listable directory
fn check_root(root: &Path) -> Result<(), ValidationError> {
    let display = root.display().to_string();

    let metadata =
        std::fs::metadata(root).map_err(|_| ValidationError::PathNotFound(display.clone()))?;
    if !metadata.is_dir() {
        return Err(ValidationError::NotADirectory(display));
    }

    std::fs::read_dir(root).map_err(|e| ValidationError::Unreadable {
        path: display,
        reason: e.to_string(),
    })?;
    Ok(())
}
