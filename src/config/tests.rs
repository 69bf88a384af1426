use super::*;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.scan.max_depth, 3);
    assert_eq!(config.scan.days_back, 7);
    assert_eq!(config.scan.max_commits_per_repository, 50);
    assert_eq!(config.scan.concurrency_limit, 8);
    assert_eq!(config.scan.timeout_secs, 30);
    assert!(config.scan.author_filter.is_none());
}

#[test]
fn test_validate_valid_config() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_zero_concurrency() {
    let mut config = Config::default();
    config.scan.concurrency_limit = 0;
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        PulseError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "scan.concurrency_limit"
    ));
}

#[test]
fn test_validate_zero_timeout() {
    let mut config = Config::default();
    config.scan.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_empty_ignore_pattern() {
    let mut config = Config::default();
    config.scan.ignore_patterns.push("  ".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    let mut config = Config::default();
    config.scan.days_back = 14;
    config.scan.author_filter = Some("me".to_string());

    config.save(path).unwrap();
    let loaded = Config::from_file(path).unwrap();

    assert_eq!(loaded.scan.days_back, 14);
    assert_eq!(loaded.scan.author_filter.as_deref(), Some("me"));
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "[scan]\nmax_depth = 5\n").unwrap();

    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(loaded.scan.max_depth, 5);
    assert_eq!(loaded.scan.days_back, 7);
    assert_eq!(loaded.scan.ignore_patterns, default_ignore_patterns());
}

#[test]
fn test_empty_file_uses_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(loaded.scan.concurrency_limit, 8);
}

#[test]
fn test_invalid_toml() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "[scan\nmax_depth = ").unwrap();
    let result = Config::from_file(temp_file.path());
    assert!(matches!(
        result.unwrap_err(),
        PulseError::Config(ConfigError::ParseFailed(_))
    ));
}

#[test]
fn test_load_nonexistent_file() {
    let result = Config::from_file(Path::new("/nonexistent/config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        PulseError::Config(ConfigError::FileNotFound(_))
    ));
}

#[test]
fn test_apply_env_overrides() {
    // Safety: these variables are only touched by this test
    unsafe {
        std::env::set_var("REPO_PULSE_MAX_DEPTH", "6");
        std::env::set_var("REPO_PULSE_DAYS_BACK", "30");
        std::env::set_var("REPO_PULSE_CONCURRENCY", "not-a-number");
        std::env::set_var("REPO_PULSE_AUTHOR", "bob");
    }

    let mut config = Config::default();
    config.apply_env_overrides();

    assert_eq!(config.scan.max_depth, 6);
    assert_eq!(config.scan.days_back, 30);
    assert_eq!(config.scan.concurrency_limit, 8);
    assert_eq!(config.scan.author_filter.as_deref(), Some("bob"));

    unsafe {
        std::env::remove_var("REPO_PULSE_MAX_DEPTH");
        std::env::remove_var("REPO_PULSE_DAYS_BACK");
        std::env::remove_var("REPO_PULSE_CONCURRENCY");
        std::env::remove_var("REPO_PULSE_AUTHOR");
    }
}

#[test]
fn test_to_scan_config() {
    let mut defaults = ScanDefaults::default();
    defaults.timeout_secs = 5;
    defaults.author_filter = Some("alice".to_string());

    let scan = defaults.to_scan_config("/work");
    assert_eq!(scan.root_directory, PathBuf::from("/work"));
    assert_eq!(scan.timeout, Duration::from_secs(5));
    assert_eq!(scan.author_filter.as_deref(), Some("alice"));
    assert_eq!(scan.ignore_patterns, defaults.ignore_patterns);
}
