//! Repository discovery by bounded-depth directory traversal
//!
//! The walk uses an explicit worklist rather than recursion, stops descending
//! as soon as a repository root is found, and treats unreadable directories as
//! dead branches instead of failing the whole scan.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// Subdirectory whose presence marks a repository root
pub const REPOSITORY_MARKER: &str = ".git";

/// Check whether a directory name matches any ignore pattern
///
/// Patterns are plain substrings; an empty pattern never matches.
pub fn should_ignore(name: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| !pattern.is_empty() && name.contains(pattern.as_str()))
}

/// Check whether `path` directly contains a repository marker directory
pub fn is_repository_root(path: &Path) -> bool {
    path.join(REPOSITORY_MARKER).is_dir()
}

/// Result of examining a single worklist entry
#[derive(Debug)]
enum Expansion {
    /// The directory is a repository root
    Repository(PathBuf),
    /// Non-ignored child directories to visit next
    Children(Vec<PathBuf>),
    /// The directory could not be listed; branch abandoned
    Abandoned,
}

/// Walks a directory tree looking for repository roots
#[derive(Debug, Clone)]
pub struct RepositoryScanner {
    pub(crate) root: PathBuf,
    pub(crate) max_depth: usize,
    pub(crate) ignore_patterns: Vec<String>,
}

impl RepositoryScanner {
    pub fn new(root: impl AsRef<Path>, max_depth: usize) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_depth,
            ignore_patterns: vec![],
        }
    }

    pub fn with_ignore_patterns(mut self, ignore_patterns: Vec<String>) -> Self {
        self.ignore_patterns = ignore_patterns;
        self
    }

    /// Find repository roots, in discovery order
    ///
    /// Entries are processed first-in first-out, so shallower repositories are
    /// reported before deeper ones. Siblings appear in directory-listing order.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut repositories = Vec::new();
        let mut worklist = VecDeque::from([(self.root.clone(), 0usize)]);

        while let Some((path, depth)) = worklist.pop_front() {
            if depth >= self.max_depth {
                continue;
            }

            match expand(&path, &self.ignore_patterns) {
                Expansion::Repository(repo) => repositories.push(repo),
                Expansion::Children(children) => {
                    worklist.extend(children.into_iter().map(|child| (child, depth + 1)));
                }
                Expansion::Abandoned => {}
            }
        }

        tracing::info!(
            "Found {} repositories under {}",
            repositories.len(),
            self.root.display()
        );
        repositories
    }

    /// Find repository roots, expanding up to `parallelism` directories at once
    ///
    /// Each expansion runs as a blocking task; results are drained as they
    /// finish, so the returned order follows completion rather than traversal.
    pub async fn scan_concurrent(&self, parallelism: usize) -> anyhow::Result<Vec<PathBuf>> {
        let parallelism = parallelism.max(1);
        let patterns = std::sync::Arc::new(self.ignore_patterns.clone());

        let mut repositories = Vec::new();
        let mut pending = VecDeque::from([(self.root.clone(), 0usize)]);
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.len() < parallelism {
                let Some((path, depth)) = pending.pop_front() else {
                    break;
                };
                if depth >= self.max_depth {
                    continue;
                }
                let patterns = patterns.clone();
                in_flight.spawn_blocking(move || (expand(&path, &patterns), depth));
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined? {
                (Expansion::Repository(repo), _) => repositories.push(repo),
                (Expansion::Children(children), depth) => {
                    pending.extend(children.into_iter().map(|child| (child, depth + 1)));
                }
                (Expansion::Abandoned, _) => {}
            }
        }

        tracing::info!(
            "Found {} repositories under {} ({} parallel expansions)",
            repositories.len(),
            self.root.display(),
            parallelism
        );
        Ok(repositories)
    }
}

/// Examine one directory: either it is a repository, or list its children
fn expand(path: &Path, ignore_patterns: &[String]) -> Expansion {
    if is_repository_root(path) {
        tracing::debug!("Repository found: {}", path.display());
        return Expansion::Repository(path.to_path_buf());
    }

    let mut children = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            // Depth 0 means the directory itself could not be opened
            Err(e) if e.depth() == 0 => {
                tracing::warn!("Skipping unreadable directory {}: {}", path.display(), e);
                return Expansion::Abandoned;
            }
            Err(e) => {
                tracing::warn!("Skipping entry in {}: {}", path.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if should_ignore(&name, ignore_patterns) {
            tracing::debug!("Ignoring directory: {}", entry.path().display());
            continue;
        }

        children.push(entry.into_path());
    }

    Expansion::Children(children)
}
