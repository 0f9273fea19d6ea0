/// Platform-specific locations of the index, config and lock files
///
/// Directories come from `dirs` (XDG on Linux, Known Folders on Windows,
/// `~/Library/Application Support` on macOS). When the platform has no such
/// directory, the current directory is used.
use std::path::PathBuf;

const APP_DIR: &str = "dagger-index";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Base directory for persistent data
    pub fn data_dir() -> PathBuf {
        dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Base directory for configuration files
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {data_dir}/dagger-index
    pub fn project_data_dir() -> PathBuf {
        Self::data_dir().join(APP_DIR)
    }

    /// Returns: {config_dir}/dagger-index
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// Machine-local directory for cross-process lock files.
    ///
    /// Returns: {data_local_dir}/dagger-index/locks
    pub fn locks_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(Self::data_dir)
            .join(APP_DIR)
            .join("locks")
    }

    /// Returns: {data_dir}/dagger-index/index.dgix
    pub fn default_index_path() -> PathBuf {
        Self::project_data_dir().join("index.dgix")
    }

    /// Returns: {config_dir}/dagger-index/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}
