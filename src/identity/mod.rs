//! Author filter resolution and local git identity lookup
//!
//! The identity is looked up once per [`IdentityResolver`] and working
//! directory, and cached inside the resolver. Callers own the resolver, so there is no process-wide state;
//! long-lived callers call [`IdentityResolver::invalidate`] to pick up changes.

mod filter;

pub use filter::ResolvedAuthorFilter;

use crate::error::IdentityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Filter token that selects the local identity
pub const MINE_TOKEN: &str = "me";

/// The local user's configured git identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// True when neither name nor email is configured
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Scope of a git configuration lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    /// `--global`, the user's own configuration
    Global,
    /// Effective configuration for the working directory (repository scope)
    Local,
}

/// Where identity values come from
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Look up a single config value; `Ok(None)` means unset at that scope
    ///
    /// `working_dir` is the directory whose repository configuration applies
    /// to [`ConfigScope::Local`]; `None` means the process's own directory.
    async fn lookup(
        &self,
        key: &str,
        scope: ConfigScope,
        working_dir: Option<&Path>,
    ) -> Result<Option<String>, IdentityError>;
}

/// Reads identity values with `git config`
#[derive(Debug, Clone, Default)]
pub struct GitConfigSource;

impl GitConfigSource {
    pub fn new() -> Self {
        Self
    }

    /// The `git config` invocation for one lookup
    pub fn command(&self, key: &str, scope: ConfigScope, working_dir: Option<&Path>) -> Command {
        let mut command = Command::new("git");
        command.arg("config");
        if scope == ConfigScope::Global {
            command.arg("--global");
        }
        command
            .arg(key)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl IdentitySource for GitConfigSource {
    async fn lookup(
        &self,
        key: &str,
        scope: ConfigScope,
        working_dir: Option<&Path>,
    ) -> Result<Option<String>, IdentityError> {
        let output = self
            .command(key, scope, working_dir)
            .output()
            .await
            .map_err(|e| IdentityError::QueryFailed(e.to_string()))?;

        // git config exits 1 for a missing key; any failure counts as unset
        if !output.status.success() {
            tracing::debug!("git config {} ({:?}) is unset", key, scope);
            return Ok(None);
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }
}

/// Identity cached together with the directory it was resolved in
struct CachedIdentity {
    working_dir: Option<PathBuf>,
    identity: Identity,
}

/// Resolves author filter tokens, caching the identity lookup
pub struct IdentityResolver {
    source: Arc<dyn IdentitySource>,
    cached: Mutex<Option<CachedIdentity>>,
}

impl IdentityResolver {
    pub fn new(source: Arc<dyn IdentitySource>) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Resolver backed by `git config`
    pub fn git() -> Self {
        Self::new(Arc::new(GitConfigSource::new()))
    }

    /// The identity for the process's current directory
    pub async fn current_user(&self) -> Result<Identity, IdentityError> {
        self.current_user_in(None).await
    }

    /// The identity that applies in `working_dir`, looked up on first use
    ///
    /// Each value prefers the global scope and falls back to the repository
    /// scope of `working_dir`. The cache is reused only for the same directory.
    pub async fn current_user_in(
        &self,
        working_dir: Option<&Path>,
    ) -> Result<Identity, IdentityError> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.working_dir.as_deref() == working_dir {
                return Ok(entry.identity.clone());
            }
        }

        let identity = Identity {
            name: self.lookup_with_fallback("user.name", working_dir).await?,
            email: self.lookup_with_fallback("user.email", working_dir).await?,
        };
        tracing::debug!("Resolved git identity: {:?}", identity);

        *cached = Some(CachedIdentity {
            working_dir: working_dir.map(Path::to_path_buf),
            identity: identity.clone(),
        });
        Ok(identity)
    }

    /// Forget the cached identity so the next lookup queries git again
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Turn a raw filter token into a filter, using the current directory for
    /// repository-scope identity
    pub async fn resolve(
        &self,
        token: Option<&str>,
    ) -> Result<ResolvedAuthorFilter, IdentityError> {
        self.resolve_in(token, None).await
    }

    /// Turn a raw filter token into a filter
    ///
    /// Missing or blank tokens select everything, `"me"` selects the identity
    /// that applies in `working_dir`, and anything else is a literal author
    /// substring. Asking for `"me"` with no identity configured is an error.
    pub async fn resolve_in(
        &self,
        token: Option<&str>,
        working_dir: Option<&Path>,
    ) -> Result<ResolvedAuthorFilter, IdentityError> {
        let token = token.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Ok(ResolvedAuthorFilter::All);
        }

        if token != MINE_TOKEN {
            return Ok(ResolvedAuthorFilter::Literal {
                text: token.to_string(),
            });
        }

        let identity = self.current_user_in(working_dir).await?;
        if identity.is_empty() {
            return Err(IdentityError::Unconfigured);
        }

        Ok(ResolvedAuthorFilter::Mine {
            name: identity.name,
            email: identity.email,
        })
    }

    async fn lookup_with_fallback(
        &self,
        key: &str,
        working_dir: Option<&Path>,
    ) -> Result<Option<String>, IdentityError> {
        if let Some(value) = self
            .source
            .lookup(key, ConfigScope::Global, working_dir)
            .await?
        {
            return Ok(Some(value));
        }
        self.source
            .lookup(key, ConfigScope::Local, working_dir)
            .await
    }
}

#[cfg(test)]
mod tests;
