use serde::{Deserialize, Serialize};

/// Whether an indexing run rebuilt everything or only changed files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingMode {
    /// Every file was (re)indexed
    Full,
    /// Only files whose content hash changed were reindexed
    Incremental,
}

/// Result of an indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub mode: IndexingMode,
    /// Files whose entries were replaced
    pub files_indexed: usize,
    /// Files skipped because their hash was unchanged
    pub files_skipped: usize,
    /// Files that disappeared from the model and were invalidated
    pub files_removed: usize,
    /// Distinct (key, value) pairs written
    pub entries_written: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
    /// RFC 3339 timestamp of the run
    pub indexed_at: String,
}

impl IndexStats {
    /// True if the run changed the index
    pub fn changed(&self) -> bool {
        self.files_indexed > 0 || self.files_removed > 0
    }
}

/// Statistics about the persisted index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatistics {
    /// Number of indexed source files
    pub total_files: usize,
    /// Number of distinct keys
    pub total_keys: usize,
    /// Number of stored records
    pub total_records: usize,
    /// Location of the index file
    pub index_path: String,
    /// Size of the index file in bytes (0 if not yet saved)
    pub index_size_bytes: u64,
    /// Registered concepts in precedence order
    pub concepts: Vec<String>,
}

/// One element in a query result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSummary {
    /// Element role (provider, consumer, component, ...)
    pub role: String,
    /// Concept-specific flavour, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `Class`, `Class.member` or `Class.member(parameter)`
    pub name: String,
    /// Relevant type
    #[serde(rename = "type")]
    pub ty: String,
    /// Qualifier annotation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    /// Source file
    pub file: String,
}

/// A related element with the relation that links it to the query element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedItem {
    /// Relation label, e.g. "Providers" or "Parent components"
    pub label: String,
    pub element: ElementSummary,
}

/// Result of a related-elements query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedResponse {
    /// The queried element, `None` if the declaration is not a DI participant
    pub source: Option<ElementSummary>,
    pub related: Vec<RelatedItem>,
    /// Time taken in milliseconds
    pub duration_ms: u64,
}

/// Response from clear operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    /// Whether the operation succeeded
    pub success: bool,
    /// Optional message
    pub message: String,
}
