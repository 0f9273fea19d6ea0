/// Centralized error types for dagger-index using thiserror
///
/// Only I/O-level and format-level failures are errors. A declaration that does
/// not fit a concept, or whose type cannot be determined, is a non-match and
/// never reaches this module.
use thiserror::Error;

/// Main error type for the indexing and resolution engine
#[derive(Error, Debug)]
pub enum DaggerIndexError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source model error: {0}")]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data type tag {tag} is registered by both '{first}' and '{second}'")]
    DuplicateDataType {
        tag: u8,
        first: &'static str,
        second: &'static str,
    },

    #[error("{0}")]
    Other(String),
}

/// Errors raised while decoding a binary index record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unknown data type tag: {0}")]
    UnknownTag(u8),

    #[error("Unexpected end of record while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("String field is not valid UTF-8")]
    InvalidUtf8,

    #[error("Varint does not fit in 32 bits")]
    VarintOverflow,

    #[error("Record has {0} trailing bytes")]
    TrailingBytes(usize),
}

/// Errors related to the persistent index
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Index file has an unrecognized header")]
    BadMagic,

    #[error("Index format version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u8, expected: u8 },

    #[error("Index is incompatible and must be rebuilt: {0}")]
    IncompatibleIndex(#[from] CodecError),

    #[error("Failed to load index from '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Failed to save index to '{path}': {reason}")]
    SaveFailed { path: String, reason: String },

    #[error("Timed out waiting for index lock on '{0}'")]
    LockTimeout(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to loading declaration facts
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read facts file '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse facts: {0}")]
    ParseFailed(String),

    #[error("Invalid type reference '{0}'")]
    InvalidType(String),

    #[error("Duplicate source file in facts: {0}")]
    DuplicateFile(String),
}

impl From<anyhow::Error> for DaggerIndexError {
    fn from(err: anyhow::Error) -> Self {
        DaggerIndexError::Other(format!("{:#}", err))
    }
}

impl DaggerIndexError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        DaggerIndexError::Other(msg.into())
    }

    /// True when the on-disk index cannot be trusted and must be fully rebuilt
    pub fn is_incompatible_index(&self) -> bool {
        matches!(
            self,
            DaggerIndexError::Codec(_)
                | DaggerIndexError::Storage(
                    StorageError::BadMagic
                        | StorageError::UnsupportedVersion { .. }
                        | StorageError::IncompatibleIndex(_)
                )
        )
    }

    /// Check if this is a user error (bad config or facts) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DaggerIndexError::Config(_) | DaggerIndexError::Model(ModelError::InvalidType(_))
        )
    }
}
