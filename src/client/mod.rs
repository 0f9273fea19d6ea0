//! Core library client for dagger-index
//!
//! [`DaggerIndex`] ties the configuration, the concept registry and the
//! persistent store together. It is what the CLI drives, and the entry point
//! for using the engine as a library.

mod fs_lock;

pub use fs_lock::FsLockGuard;

use crate::concepts::ConceptRegistry;
use crate::config::Config;
use crate::element::Element;
use crate::error::{DaggerIndexError, StorageError};
use crate::index::IndexStore;
use crate::indexing::IndexingEngine;
use crate::model::{DeclId, SourceModel};
use crate::resolve::Resolver;
use crate::types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main client for indexing a project and querying related elements
///
/// # Example
///
/// ```no_run
/// use dagger_index::{DaggerIndex, ProjectModel};
///
/// fn main() -> anyhow::Result<()> {
///     let index = DaggerIndex::new()?;
///     let model = ProjectModel::load(&["facts/".into()])?;
///
///     let stats = index.index(&model, false)?;
///     println!("Indexed {} files", stats.files_indexed);
///     Ok(())
/// }
/// ```
pub struct DaggerIndex {
    pub(crate) config: Arc<Config>,
    pub(crate) registry: ConceptRegistry,
    pub(crate) store: IndexStore,
    pub(crate) index_path: PathBuf,
}

impl DaggerIndex {
    /// Create a client from the config file, environment and defaults
    pub fn new() -> Result<Self> {
        let config = Config::new().context("Failed to load configuration")?;
        Self::with_config(config)
    }

    /// Create a client with a custom configuration, loading the index file it
    /// names
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let registry = ConceptRegistry::new();
        let index_path = config.index.path.clone();
        let timeout = Duration::from_secs(config.index.lock_timeout_secs);

        let store = {
            let _lock = acquire_lock(&index_path, timeout)?;
            load_store(&index_path, &registry)?
        };

        tracing::info!(
            "Opened index {:?} ({} concepts)",
            index_path,
            registry.concept_names().len()
        );

        Ok(Self {
            config: Arc::new(config),
            registry,
            store,
            index_path,
        })
    }

    /// Create a client with a custom index path (for testing)
    pub fn with_index_path(index_path: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.index.path = index_path.into();
        Self::with_config(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ConceptRegistry {
        &self.registry
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Bring the index in line with `model` and persist it.
    ///
    /// Unchanged files are skipped unless `force` is set.
    pub fn index(&self, model: &dyn SourceModel, force: bool) -> Result<IndexStats> {
        let engine = IndexingEngine::new(&self.registry)
            .with_parallel(self.config.indexing.parallel)
            .with_max_threads(self.config.indexing.max_threads);
        let stats = engine.index_project(model, &self.store, force);

        if stats.changed() || !self.index_path.exists() {
            self.save()?;
        }
        Ok(stats)
    }

    /// Resolver over `model` and this index
    pub fn resolver<'a>(&'a self, model: &'a dyn SourceModel) -> Resolver<'a> {
        Resolver::new(model, &self.store, &self.registry)
            .with_type_aliases(self.config.resolution.include_type_aliases)
    }

    /// Identify a declaration as a DI element
    pub fn identify(&self, model: &dyn SourceModel, id: DeclId) -> Option<Element> {
        self.registry.identify(model, id)
    }

    /// Related elements of the declaration `id`, labelled by relation
    pub fn related(&self, model: &dyn SourceModel, id: DeclId) -> Result<RelatedResponse> {
        let start = Instant::now();
        let resolver = self.resolver(model);

        let Some(element) = resolver.identify(id) else {
            tracing::debug!("Declaration {} is not a DI element", id);
            return Ok(RelatedResponse {
                source: None,
                related: Vec::new(),
                duration_ms: start.elapsed().as_millis() as u64,
            });
        };

        let related = resolver
            .related_summaries(&element)
            .map_err(|e| self.incompatible(e.into()))?;

        Ok(RelatedResponse {
            source: Some(resolver.summarize(&element)),
            related,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Statistics about the index
    pub fn stats(&self) -> Result<IndexStatistics> {
        let stats = self.store.stats();
        let index_size_bytes = std::fs::metadata(&self.index_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(IndexStatistics {
            total_files: stats.files,
            total_keys: stats.keys,
            total_records: stats.records,
            index_path: self.index_path.display().to_string(),
            index_size_bytes,
            concepts: self
                .registry
                .concept_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Drop every entry and remove the index file
    pub fn clear(&self) -> Result<ClearResponse> {
        let _lock = acquire_lock(&self.index_path, self.lock_timeout())?;
        self.store.clear();

        if self.index_path.exists() {
            std::fs::remove_file(&self.index_path)
                .with_context(|| format!("Failed to remove {:?}", self.index_path))?;
        }

        tracing::info!("Cleared index {:?}", self.index_path);
        Ok(ClearResponse {
            success: true,
            message: format!("Cleared index at {}", self.index_path.display()),
        })
    }

    /// Persist the store under the cross-process lock
    pub fn save(&self) -> Result<()> {
        let _lock = acquire_lock(&self.index_path, self.lock_timeout())?;
        self.store
            .save(&self.index_path)
            .map_err(DaggerIndexError::from)?;
        Ok(())
    }

    fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.config.index.lock_timeout_secs)
    }

    /// An index that fails to decode at query time is dropped, so the next
    /// indexing run rebuilds it from scratch
    fn incompatible(&self, err: DaggerIndexError) -> anyhow::Error {
        if err.is_incompatible_index() {
            tracing::warn!("Discarding incompatible index: {}", err);
            self.store.clear();
        }
        anyhow::Error::new(err)
    }
}

fn acquire_lock(index_path: &Path, timeout: Duration) -> Result<FsLockGuard> {
    FsLockGuard::acquire_blocking(index_path, timeout)?
        .ok_or_else(|| StorageError::LockTimeout(index_path.display().to_string()))
        .map_err(|e| anyhow::Error::new(DaggerIndexError::from(e)))
}

/// Load the index file. An incompatible file is discarded and replaced by an
/// empty store, which makes the next run a full rebuild.
fn load_store(path: &Path, registry: &ConceptRegistry) -> Result<IndexStore> {
    match IndexStore::load(path, registry) {
        Ok(store) => Ok(store),
        Err(e) => {
            let err = DaggerIndexError::from(e);
            if err.is_incompatible_index() {
                tracing::warn!("Index {:?} is incompatible, rebuilding: {}", path, err);
                Ok(IndexStore::new())
            } else {
                Err(anyhow::Error::new(err))
            }
        }
    }
}
