use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

/// In-memory identity source that counts lookups and records their directories
#[derive(Default)]
struct FakeSource {
    values: HashMap<(String, bool), String>,
    lookups: AtomicUsize,
    local_dirs: StdMutex<Vec<Option<PathBuf>>>,
}

impl FakeSource {
    fn with(mut self, key: &str, scope: ConfigScope, value: &str) -> Self {
        self.values
            .insert((key.to_string(), scope == ConfigScope::Global), value.to_string());
        self
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn local_dirs(&self) -> Vec<Option<PathBuf>> {
        self.local_dirs.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentitySource for FakeSource {
    async fn lookup(
        &self,
        key: &str,
        scope: ConfigScope,
        working_dir: Option<&Path>,
    ) -> Result<Option<String>, IdentityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if scope == ConfigScope::Local {
            self.local_dirs
                .lock()
                .unwrap()
                .push(working_dir.map(Path::to_path_buf));
        }
        Ok(self
            .values
            .get(&(key.to_string(), scope == ConfigScope::Global))
            .cloned())
    }
}

struct FailingSource;

#[async_trait]
impl IdentitySource for FailingSource {
    async fn lookup(
        &self,
        _key: &str,
        _scope: ConfigScope,
        _working_dir: Option<&Path>,
    ) -> Result<Option<String>, IdentityError> {
        Err(IdentityError::QueryFailed("git: command not found".to_string()))
    }
}

#[tokio::test]
async fn test_resolve_none_and_blank_is_all() {
    let resolver = IdentityResolver::new(Arc::new(FakeSource::default()));
    assert_eq!(resolver.resolve(None).await.unwrap(), ResolvedAuthorFilter::All);
    assert_eq!(resolver.resolve(Some("")).await.unwrap(), ResolvedAuthorFilter::All);
    assert_eq!(resolver.resolve(Some("   ")).await.unwrap(), ResolvedAuthorFilter::All);
}

#[tokio::test]
async fn test_resolve_literal() {
    let source = Arc::new(FakeSource::default());
    let resolver = IdentityResolver::new(source.clone());

    let filter = resolver.resolve(Some(" Bob ")).await.unwrap();
    assert_eq!(
        filter,
        ResolvedAuthorFilter::Literal {
            text: "Bob".to_string()
        }
    );
    assert_eq!(source.lookups(), 0, "literal filters never query git");
}

#[tokio::test]
async fn test_resolve_me_prefers_global() {
    let source = FakeSource::default()
        .with("user.name", ConfigScope::Global, "Global Name")
        .with("user.name", ConfigScope::Local, "Local Name")
        .with("user.email", ConfigScope::Local, "local@example.com");
    let resolver = IdentityResolver::new(Arc::new(source));

    let filter = resolver.resolve(Some("me")).await.unwrap();
    assert_eq!(
        filter,
        ResolvedAuthorFilter::Mine {
            name: Some("Global Name".to_string()),
            email: Some("local@example.com".to_string()),
        }
    );
}

#[tokio::test]
async fn test_resolve_me_unconfigured_is_error() {
    let resolver = IdentityResolver::new(Arc::new(FakeSource::default()));
    let err = resolver.resolve(Some("me")).await.unwrap_err();
    assert!(matches!(err, IdentityError::Unconfigured));
}

#[tokio::test]
async fn test_resolve_me_query_failure_propagates() {
    let resolver = IdentityResolver::new(Arc::new(FailingSource));
    let err = resolver.resolve(Some("me")).await.unwrap_err();
    assert!(matches!(err, IdentityError::QueryFailed(_)));
}

#[tokio::test]
async fn test_identity_cached_until_invalidated() {
    let source = Arc::new(FakeSource::default().with("user.name", ConfigScope::Global, "Alice"));
    let resolver = IdentityResolver::new(source.clone());

    resolver.current_user().await.unwrap();
    let after_first = source.lookups();
    assert!(after_first > 0);

    resolver.current_user().await.unwrap();
    resolver.resolve(Some("me")).await.unwrap();
    assert_eq!(source.lookups(), after_first);

    resolver.invalidate().await;
    resolver.current_user().await.unwrap();
    assert_eq!(source.lookups(), after_first * 2);
}

#[tokio::test]
async fn test_mine_filter_matches_resolved_name() {
    let source = FakeSource::default().with("user.name", ConfigScope::Global, "Alice");
    let resolver = IdentityResolver::new(Arc::new(source));

    let filter = resolver.resolve(Some("me")).await.unwrap();
    assert!(filter.matches("Alice <alice@example.com>"));
    assert!(!filter.matches("Bob <bob@example.com>"));
}

#[tokio::test]
async fn test_local_fallback_uses_working_dir() {
    let source = Arc::new(FakeSource::default().with("user.name", ConfigScope::Local, "Repo Name"));
    let resolver = IdentityResolver::new(source.clone());

    let filter = resolver
        .resolve_in(Some("me"), Some(Path::new("/work/src")))
        .await
        .unwrap();
    assert_eq!(
        filter,
        ResolvedAuthorFilter::Mine {
            name: Some("Repo Name".to_string()),
            email: None,
        }
    );
    assert_eq!(
        source.local_dirs(),
        vec![Some(PathBuf::from("/work/src")); 2]
    );
}

#[tokio::test]
async fn test_cache_is_per_working_dir() {
    let source = Arc::new(FakeSource::default().with("user.name", ConfigScope::Global, "Alice"));
    let resolver = IdentityResolver::new(source.clone());

    resolver.current_user_in(Some(Path::new("/a"))).await.unwrap();
    let after_first = source.lookups();
    resolver.current_user_in(Some(Path::new("/a"))).await.unwrap();
    assert_eq!(source.lookups(), after_first);

    resolver.current_user_in(Some(Path::new("/b"))).await.unwrap();
    assert_eq!(source.lookups(), after_first * 2);
}

#[test]
fn test_git_config_command_scope_and_dir() {
    let source = GitConfigSource::new();

    let global = source.command("user.name", ConfigScope::Global, Some(Path::new("/repo")));
    let args: Vec<_> = global.as_std().get_args().collect();
    assert_eq!(args, ["config", "--global", "user.name"]);

    let local = source.command("user.email", ConfigScope::Local, Some(Path::new("/repo")));
    let args: Vec<_> = local.as_std().get_args().collect();
    assert_eq!(args, ["config", "user.email"]);
    assert_eq!(local.as_std().get_current_dir(), Some(Path::new("/repo")));

    let unscoped = source.command("user.name", ConfigScope::Local, None);
    assert_eq!(unscoped.as_std().get_current_dir(), None);
}

#[test]
fn test_identity_is_empty() {
    assert!(Identity::default().is_empty());
    let identity = Identity {
        name: None,
        email: Some("a@b.c".to_string()),
    };
    assert!(!identity.is_empty());
}
