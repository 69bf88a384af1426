//! Concurrent history queries with a global deadline
//!
//! One external process runs per repository in a batch. A single task polls
//! every repository's future together with the deadline, so the completion
//! table and result list are only ever touched from that task and need no
//! locking. Each repository completes exactly once: with its output, with a
//! failure, or terminated when the deadline passes or the caller cancels.
//!
//! ```text
//!  spawn ──► stream stdout/stderr ──► exit ──► complete(Succeeded | Failed)
//!                    │
//!          deadline / cancel ──► kill + reap ──► complete(TimedOut)
//! ```

mod process;

use crate::aggregate;
use crate::error::ScanError;
use crate::git::HistoryCommand;
use crate::identity::ResolvedAuthorFilter;
use crate::types::RepositoryResult;
use futures::stream::{FuturesUnordered, StreamExt};
use process::ProcessExit;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default wall-clock budget for one batch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a repository's query ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// Exited zero, whether or not any commit survived filtering
    Succeeded,
    /// Failed to spawn, failed while streaming, or exited non-zero
    Failed,
    /// Terminated by the deadline or by cancellation
    TimedOut,
}

/// Per-repository completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepoProcessState {
    Pending,
    Completed(CompletionStatus),
}

impl RepoProcessState {
    /// Move from `Pending` to `Completed`; returns false if already completed
    pub(crate) fn complete(&mut self, status: CompletionStatus) -> bool {
        match self {
            RepoProcessState::Pending => {
                *self = RepoProcessState::Completed(status);
                true
            }
            RepoProcessState::Completed(_) => false,
        }
    }
}

/// Results of one or more batches
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Non-empty repository results in completion order
    pub results: Vec<RepositoryResult>,
    /// Queries that exited zero, including ones with no matching commits
    pub succeeded: usize,
    /// Queries that could not run or exited non-zero
    pub failed: usize,
    /// Queries terminated by the deadline or cancellation
    pub timed_out: usize,
}

impl BatchOutcome {
    fn absorb(&mut self, other: BatchOutcome) {
        self.results.extend(other.results);
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.timed_out += other.timed_out;
    }
}

/// Runs history queries for batches of repositories
pub struct ProcessOrchestrator {
    command: Arc<dyn HistoryCommand>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ProcessOrchestrator {
    pub fn new(command: Arc<dyn HistoryCommand>) -> Self {
        Self {
            command,
            timeout: DEFAULT_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the per-batch deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Terminate outstanding queries when `cancel` fires, exactly as if the
    /// deadline had passed
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one batch concurrently and wait for every repository to complete
    ///
    /// Results arrive in completion order. Failures and timeouts reduce the
    /// result set but never fail the batch.
    pub async fn run(&self, batch: &[PathBuf], filter: &ResolvedAuthorFilter) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        if batch.is_empty() {
            return outcome;
        }

        let started = Instant::now();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        // Cancelled on deadline; also follows the caller's token
        let abort = self.cancel.child_token();
        let mut states = vec![RepoProcessState::Pending; batch.len()];
        let mut in_flight: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let command = self.command.command(path);
                let abort = abort.clone();
                async move { (index, process::run_to_exit(command, abort).await) }
            })
            .collect();

        tracing::debug!("Started {} history queries", batch.len());

        loop {
            tokio::select! {
                next = in_flight.next() => {
                    let Some((index, exit)) = next else { break };
                    let status = Self::settle(&batch[index], exit, filter, &mut outcome);
                    if !states[index].complete(status) {
                        tracing::warn!(
                            "Ignoring repeated completion for {}",
                            batch[index].display()
                        );
                    }
                }
                _ = &mut deadline, if !abort.is_cancelled() => {
                    let pending = states
                        .iter()
                        .filter(|s| **s == RepoProcessState::Pending)
                        .count();
                    tracing::warn!(
                        "History queries exceeded {:?}; terminating {} still running",
                        self.timeout,
                        pending
                    );
                    abort.cancel();
                }
            }
        }

        tracing::info!(
            "Batch of {} finished in {:?}: {} with commits, {} failed, {} timed out",
            batch.len(),
            started.elapsed(),
            outcome.results.len(),
            outcome.failed,
            outcome.timed_out
        );
        outcome
    }

    /// Run `repositories` in sequential batches of `batch_size`
    ///
    /// At most `batch_size` processes are alive at any time. Results are
    /// concatenated in batch order.
    pub async fn run_batched(
        &self,
        repositories: &[PathBuf],
        batch_size: usize,
        filter: &ResolvedAuthorFilter,
    ) -> BatchOutcome {
        let mut combined = BatchOutcome::default();
        let mut batches = Vec::new();

        for (number, batch) in repositories.chunks(batch_size.max(1)).enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Scan cancelled before batch {}", number + 1);
                break;
            }
            tracing::debug!("Running batch {} ({} repositories)", number + 1, batch.len());

            let mut outcome = self.run(batch, filter).await;
            batches.push(std::mem::take(&mut outcome.results));
            combined.absorb(outcome);
        }

        combined.results = aggregate::concat_batches(batches);
        combined
    }

    /// Blocking form of [`run_batched`](Self::run_batched)
    ///
    /// Drives a private single-threaded runtime on the calling thread until
    /// every batch has completed or hit its deadline. Must not be called from
    /// inside an async runtime.
    pub fn run_blocking(
        &self,
        repositories: &[PathBuf],
        batch_size: usize,
        filter: &ResolvedAuthorFilter,
    ) -> Result<BatchOutcome, ScanError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ScanError::RuntimeFailed(
                "blocking scan called from within an async runtime".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ScanError::RuntimeFailed(e.to_string()))?;

        Ok(runtime.block_on(self.run_batched(repositories, batch_size, filter)))
    }

    /// Record a repository's exit in `outcome` and return its final status
    fn settle(
        path: &Path,
        exit: ProcessExit,
        filter: &ResolvedAuthorFilter,
        outcome: &mut BatchOutcome,
    ) -> CompletionStatus {
        match exit {
            ProcessExit::Exited {
                status,
                stdout,
                stderr,
            } if status.success() => {
                outcome.succeeded += 1;
                let text = String::from_utf8_lossy(&stdout);
                match aggregate::finalize_repository(path.to_path_buf(), &text, filter) {
                    Some(result) => {
                        tracing::debug!(
                            "{}: {} commits",
                            path.display(),
                            result.commits.len()
                        );
                        outcome.results.push(result);
                        CompletionStatus::Succeeded
                    }
                    None => {
                        if !stderr.is_empty() {
                            tracing::debug!(
                                "{}: no commits; stderr: {}",
                                path.display(),
                                String::from_utf8_lossy(&stderr).trim()
                            );
                        }
                        CompletionStatus::Succeeded
                    }
                }
            }
            ProcessExit::Exited { status, stderr, .. } => {
                outcome.failed += 1;
                tracing::warn!(
                    "History query failed in {} ({}): {}",
                    path.display(),
                    status,
                    first_line(&stderr)
                );
                CompletionStatus::Failed
            }
            ProcessExit::SpawnFailed(e) => {
                outcome.failed += 1;
                tracing::warn!("Could not start history query in {}: {}", path.display(), e);
                CompletionStatus::Failed
            }
            ProcessExit::StreamFailed(e) => {
                outcome.failed += 1;
                tracing::warn!("Lost output of history query in {}: {}", path.display(), e);
                CompletionStatus::Failed
            }
            ProcessExit::Terminated => {
                outcome.timed_out += 1;
                tracing::debug!("Terminated history query in {}", path.display());
                CompletionStatus::TimedOut
            }
        }
    }
}

fn first_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
