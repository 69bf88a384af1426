/// Platform-specific config path computation
///
/// Follows the XDG Base Directory specification on Linux.
use std::path::PathBuf;

/// Directory name used under the platform config directory
const APP_DIR_NAME: &str = "repo-pulse";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Returns: {config_dir}/repo-pulse
    pub fn app_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR_NAME)
    }

    /// Returns: {config_dir}/repo-pulse/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::app_config_dir().join("config.toml")
    }
}
