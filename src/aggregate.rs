/// Turns raw history output into per-repository results
///
/// Dedup, author filtering and date ordering all happen here, once per
/// repository, after its history query has exited.
use crate::git::parse_commit_line;
use crate::identity::ResolvedAuthorFilter;
use crate::types::{Commit, RepositoryResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Build a repository's result from its complete history output
///
/// Unparseable lines are dropped, the first occurrence of each commit id is
/// kept, non-matching authors are removed and the rest is stably sorted by
/// date, newest first. Returns `None` when no commit survives.
pub fn finalize_repository(
    path: PathBuf,
    output: &str,
    filter: &ResolvedAuthorFilter,
) -> Option<RepositoryResult> {
    let mut seen = HashSet::new();
    let mut commits: Vec<Commit> = output
        .lines()
        .filter_map(parse_commit_line)
        .filter(|commit| seen.insert(commit.id.clone()))
        .filter(|commit| filter.matches(&commit.author))
        .collect();

    if commits.is_empty() {
        return None;
    }

    sort_newest_first(&mut commits);
    Some(RepositoryResult { path, commits })
}

/// Stable sort by date descending
pub fn sort_newest_first(commits: &mut [Commit]) {
    commits.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Concatenate batch results in batch order
pub fn concat_batches(batches: Vec<Vec<RepositoryResult>>) -> Vec<RepositoryResult> {
    batches.into_iter().flatten().collect()
}

/// Every commit across repositories with its repository path, newest first
///
/// Same-day commits keep their relative order from `results`.
pub fn timeline(results: &[RepositoryResult]) -> Vec<(&Path, &Commit)> {
    let mut entries: Vec<(&Path, &Commit)> = results
        .iter()
        .flat_map(|result| {
            result
                .commits
                .iter()
                .map(move |commit| (result.path.as_path(), commit))
        })
        .collect();
    entries.sort_by(|a, b| b.1.date.cmp(&a.1.date));
    entries
}
