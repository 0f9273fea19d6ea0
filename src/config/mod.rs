/// Configuration system for dagger-index
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, DaggerIndexError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Persistent index configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Indexing configuration
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Resolution configuration
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

/// Persistent index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Index file path
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    /// How long to wait for another process holding the index lock
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_secs: u64,
}

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Index changed files in parallel
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Cap on indexing threads (unset = one per core)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threads: Option<usize>,
}

/// Resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Also query the keys of known type aliases
    #[serde(default = "default_include_type_aliases")]
    pub include_type_aliases: bool,
}

fn default_index_path() -> PathBuf {
    crate::paths::PlatformPaths::default_index_path()
}

fn default_lock_timeout() -> u64 {
    30
}

fn default_parallel() -> bool {
    true
}

fn default_include_type_aliases() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            lock_timeout_secs: default_lock_timeout(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            max_threads: None,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            include_type_aliases: default_include_type_aliases(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, DaggerIndexError> {
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

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, DaggerIndexError> {
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
    pub fn save(&self, path: &Path) -> Result<(), DaggerIndexError> {
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
    pub fn validate(&self) -> Result<(), DaggerIndexError> {
        if self.index.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "index.path".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        if self.index.lock_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "index.lock_timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.indexing.max_threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "indexing.max_threads".to_string(),
                reason: "must be greater than 0 when set".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DAGGER_INDEX_PATH") {
            self.index.path = PathBuf::from(path);
        }

        if let Ok(parallel) = std::env::var("DAGGER_INDEX_PARALLEL")
            && let Some(value) = parse_bool(&parallel)
        {
            self.indexing.parallel = value;
        }

        if let Ok(threads) = std::env::var("DAGGER_INDEX_THREADS")
            && let Ok(count) = threads.parse()
        {
            self.indexing.max_threads = Some(count);
        }

        if let Ok(aliases) = std::env::var("DAGGER_INDEX_ALIASES")
            && let Some(value) = parse_bool(&aliases)
        {
            self.resolution.include_type_aliases = value;
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, DaggerIndexError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
