/// Configuration system for repo-pulse
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, PulseError};
use crate::types::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Defaults applied to every scan
    #[serde(default)]
    pub scan: ScanDefaults,
}

/// Scan defaults, the `[scan]` table of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanDefaults {
    /// Directory levels searched for repositories
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Directory-name substrings that are never descended into
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Days of history to collect
    #[serde(default = "default_days_back")]
    pub days_back: u32,

    /// Commits requested per repository
    #[serde(default = "default_max_commits")]
    pub max_commits_per_repository: usize,

    /// Concurrent history queries
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Per-batch timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default author filter token (`"me"` or a name substring)
    #[serde(default)]
    pub author_filter: Option<String>,
}

fn default_max_depth() -> usize {
    3
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        "target".to_string(),
        "vendor".to_string(),
        ".cache".to_string(),
        "dist".to_string(),
        "build".to_string(),
    ]
}

fn default_days_back() -> u32 {
    7
}

fn default_max_commits() -> usize {
    50
}

fn default_concurrency_limit() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            ignore_patterns: default_ignore_patterns(),
            days_back: default_days_back(),
            max_commits_per_repository: default_max_commits(),
            concurrency_limit: default_concurrency_limit(),
            timeout_secs: default_timeout_secs(),
            author_filter: None,
        }
    }
}

impl ScanDefaults {
    /// Build a scan config rooted at `root` from these defaults
    pub fn to_scan_config(&self, root: impl AsRef<Path>) -> ScanConfig {
        ScanConfig {
            root_directory: root.as_ref().to_path_buf(),
            max_depth: self.max_depth,
            ignore_patterns: self.ignore_patterns.clone(),
            days_back: self.days_back,
            max_commits_per_repository: self.max_commits_per_repository,
            concurrency_limit: self.concurrency_limit,
            author_filter: self.author_filter.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, PulseError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), PulseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), PulseError> {
        let scan = &self.scan;
        let positive: [(&str, u64); 5] = [
            ("scan.max_depth", scan.max_depth as u64),
            ("scan.days_back", u64::from(scan.days_back)),
            (
                "scan.max_commits_per_repository",
                scan.max_commits_per_repository as u64,
            ),
            ("scan.concurrency_limit", scan.concurrency_limit as u64),
            ("scan.timeout_secs", scan.timeout_secs),
        ];

        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if scan.ignore_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "scan.ignore_patterns".to_string(),
                reason: "patterns must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(depth) = env_parse("REPO_PULSE_MAX_DEPTH") {
            self.scan.max_depth = depth;
        }

        if let Some(days) = env_parse("REPO_PULSE_DAYS_BACK") {
            self.scan.days_back = days;
        }

        if let Some(max) = env_parse("REPO_PULSE_MAX_COMMITS") {
            self.scan.max_commits_per_repository = max;
        }

        if let Some(limit) = env_parse("REPO_PULSE_CONCURRENCY") {
            self.scan.concurrency_limit = limit;
        }

        if let Some(secs) = env_parse("REPO_PULSE_TIMEOUT_SECS") {
            self.scan.timeout_secs = secs;
        }

        if let Ok(author) = std::env::var("REPO_PULSE_AUTHOR") {
            self.scan.author_filter = Some(author);
        }
    }

    /// Load from the default location, then apply environment overrides
    pub fn new() -> Result<Self, PulseError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, then apply environment overrides
    pub fn with_file(path: impl Into<PathBuf>) -> Result<Self, PulseError> {
        let mut config = Self::from_file(&path.into())?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

/// Read and parse an environment variable, ignoring unparseable values
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable value for {}: {:?}", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests;
