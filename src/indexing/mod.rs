//! Indexing engine: turns declarations into `(key, IndexValue)` pairs and
//! writes them to the store one file at a time.
//!
//! Files are independent units. A project run compares content hashes with
//! the store, reindexes changed files in parallel and invalidates files that
//! no longer exist.

use rayon::prelude::*;
use std::collections::HashSet;
use std::time::Instant;

use crate::concepts::{ConceptRegistry, DeclarationView, Entries};
use crate::index::IndexStore;
use crate::model::{DeclId, SourceFile, SourceModel};
use crate::types::{IndexStats, IndexingMode};

pub struct IndexingEngine<'a> {
    registry: &'a ConceptRegistry,
    parallel: bool,
    max_threads: Option<usize>,
}

impl<'a> IndexingEngine<'a> {
    pub fn new(registry: &'a ConceptRegistry) -> Self {
        Self {
            registry,
            parallel: true,
            max_threads: None,
        }
    }

    /// Index files on the rayon pool (default) or sequentially
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Cap the number of indexing threads
    pub fn with_max_threads(mut self, max_threads: Option<usize>) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Run every matching indexer on one declaration. Declarations that fit
    /// no concept, or lack type information, emit nothing.
    pub fn index_declaration(&self, model: &dyn SourceModel, id: DeclId) -> Entries {
        let mut entries = Entries::new();
        if let Some(view) = DeclarationView::new(model, id) {
            self.registry.index(&view, &mut entries);
        }
        entries
    }

    /// Entries for every declaration in `path`, in source order
    pub fn index_file(&self, model: &dyn SourceModel, path: &str) -> Entries {
        let mut entries = Entries::new();
        for id in model.declarations_in_file(path) {
            if let Some(view) = DeclarationView::new(model, id) {
                self.registry.index(&view, &mut entries);
            }
        }
        entries
    }

    /// Replace the stored entries of one file. Returns the number of distinct
    /// entries written.
    pub fn reindex_file(
        &self,
        model: &dyn SourceModel,
        file: &SourceFile,
        store: &IndexStore,
    ) -> usize {
        let entries = self.index_file(model, &file.path);
        let written = store.replace_file(&file.path, &file.hash, &entries);
        tracing::debug!("Indexed {} ({} entries)", file.path, written);
        written
    }

    /// Bring the store in line with the model.
    ///
    /// With `force`, every file is reindexed; otherwise files whose stored
    /// hash matches are skipped.
    pub fn index_project(
        &self,
        model: &dyn SourceModel,
        store: &IndexStore,
        force: bool,
    ) -> IndexStats {
        let start = Instant::now();
        let files = model.files();
        let current: HashSet<&str> = files.iter().map(|f| f.path.as_str()).collect();

        let mut files_removed = 0;
        for stale in store.files() {
            if !current.contains(stale.as_str()) && store.invalidate(&stale) {
                tracing::debug!("Removed vanished file {}", stale);
                files_removed += 1;
            }
        }

        let changed: Vec<&SourceFile> = files
            .iter()
            .filter(|f| force || store.file_hash(&f.path).as_deref() != Some(f.hash.as_str()))
            .collect();
        let files_skipped = files.len() - changed.len();

        let entries_written = self.reindex_all(model, store, &changed);

        let mode = if force || files_skipped == 0 {
            IndexingMode::Full
        } else {
            IndexingMode::Incremental
        };
        let stats = IndexStats {
            mode,
            files_indexed: changed.len(),
            files_skipped,
            files_removed,
            entries_written,
            duration_ms: start.elapsed().as_millis() as u64,
            indexed_at: chrono::Utc::now().to_rfc3339(),
        };

        tracing::info!(
            "Indexing complete: {} indexed, {} skipped, {} removed, {} entries in {}ms",
            stats.files_indexed,
            stats.files_skipped,
            stats.files_removed,
            stats.entries_written,
            stats.duration_ms
        );
        stats
    }

    fn reindex_all(
        &self,
        model: &dyn SourceModel,
        store: &IndexStore,
        files: &[&SourceFile],
    ) -> usize {
        if !self.parallel || files.len() < 2 {
            return files
                .iter()
                .map(|file| self.reindex_file(model, file, store))
                .sum();
        }

        let run = || -> usize {
            files
                .par_iter()
                .map(|file| self.reindex_file(model, file, store))
                .sum()
        };

        match self.max_threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(run),
                Err(e) => {
                    tracing::warn!("Failed to build indexing thread pool: {}", e);
                    run()
                }
            },
            None => run(),
        }
    }
}
