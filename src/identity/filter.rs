use serde::{Deserialize, Serialize};

/// Author predicate computed once per scan
///
/// Passed by reference into every per-repository match so the identity lookup
/// never happens more than once per scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedAuthorFilter {
    /// Every commit passes
    All,
    /// Commits by the local git identity
    Mine {
        name: Option<String>,
        email: Option<String>,
    },
    /// Commits whose author contains the text, ignoring case
    Literal { text: String },
}

impl ResolvedAuthorFilter {
    /// Check an author string (`Name <email>`) against the filter
    ///
    /// `Mine` compares case-sensitively since identity strings are exact;
    /// `Literal` compares case-insensitively.
    pub fn matches(&self, author: &str) -> bool {
        match self {
            ResolvedAuthorFilter::All => true,
            ResolvedAuthorFilter::Mine { name, email } => [name, email]
                .into_iter()
                .flatten()
                .any(|part| !part.is_empty() && author.contains(part.as_str())),
            ResolvedAuthorFilter::Literal { text } => {
                author.to_lowercase().contains(&text.to_lowercase())
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ResolvedAuthorFilter::All)
    }
}

impl std::fmt::Display for ResolvedAuthorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedAuthorFilter::All => write!(f, "all authors"),
            ResolvedAuthorFilter::Mine { name, email } => {
                let who = name.as_deref().or(email.as_deref()).unwrap_or("?");
                write!(f, "mine ({})", who)
            }
            ResolvedAuthorFilter::Literal { text } => write!(f, "author ~ '{}'", text),
        }
    }
}
