//! Persistent reverse multimap from key to encoded index values.
//!
//! Entries are partitioned by source file. Replacing or invalidating a file
//! swaps its whole entry set under one write lock, so readers see either the
//! old or the new set for that file and never a mix.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::codec::{RecordReader, RecordWriter};
use super::IndexValue;
use crate::concepts::ConceptRegistry;
use crate::error::{CodecError, StorageError};
use crate::model::Scope;

/// Magic bytes at the start of an index file
pub const INDEX_MAGIC: &[u8; 4] = b"DGIX";

/// Current index file format version
pub const INDEX_FORMAT_VERSION: u8 = 1;

type Record = Arc<[u8]>;

#[derive(Debug, Clone, Default)]
struct FileEntries {
    hash: String,
    entries: BTreeMap<String, Vec<Record>>,
}

impl FileEntries {
    fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    files: HashMap<String, FileEntries>,
    by_key: HashMap<String, BTreeSet<String>>,
}

impl StoreInner {
    fn remove_file(&mut self, file: &str) -> Option<FileEntries> {
        let old = self.files.remove(file)?;
        for key in old.entries.keys() {
            if let Some(files) = self.by_key.get_mut(key) {
                files.remove(file);
                if files.is_empty() {
                    self.by_key.remove(key);
                }
            }
        }
        Some(old)
    }

    fn insert_file(&mut self, file: String, entries: FileEntries) {
        for key in entries.entries.keys() {
            self.by_key
                .entry(key.clone())
                .or_default()
                .insert(file.clone());
        }
        self.files.insert(file, entries);
    }
}

/// Counts describing the store contents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub files: usize,
    pub keys: usize,
    pub records: usize,
}

/// In-memory index with binary persistence
#[derive(Debug, Default)]
pub struct IndexStore {
    inner: RwLock<StoreInner>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value for `file` under `key`. Returns false if the same value
    /// was already stored there.
    pub fn put(&self, file: &str, key: &str, value: &IndexValue) -> bool {
        let record: Record = value.encode().into();
        let mut inner = self.inner.write();
        let records = inner
            .files
            .entry(file.to_string())
            .or_default()
            .entries
            .entry(key.to_string())
            .or_default();
        if records.contains(&record) {
            return false;
        }
        records.push(record);
        inner
            .by_key
            .entry(key.to_string())
            .or_default()
            .insert(file.to_string());
        true
    }

    /// Atomically replace every entry of `file`. Identical (key, value) pairs
    /// collapse, so reindexing the same declarations twice is idempotent.
    pub fn replace_file(&self, file: &str, hash: &str, entries: &[(String, IndexValue)]) -> usize {
        let mut grouped: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        let mut written = 0;
        for (key, value) in entries {
            let record: Record = value.encode().into();
            let records = grouped.entry(key.clone()).or_default();
            if !records.contains(&record) {
                records.push(record);
                written += 1;
            }
        }
        let new_entries = FileEntries {
            hash: hash.to_string(),
            entries: grouped,
        };

        let mut inner = self.inner.write();
        inner.remove_file(file);
        inner.insert_file(file.to_string(), new_entries);
        written
    }

    /// Drop every entry of `file`. Returns true if the file was indexed.
    pub fn invalidate(&self, file: &str) -> bool {
        self.inner.write().remove_file(file).is_some()
    }

    /// Values stored under `key` by files visible in `scope`, in file order.
    ///
    /// Decoding happens outside the lock. An undecodable record is an
    /// incompatible index and is reported rather than skipped.
    pub fn get(
        &self,
        key: &str,
        scope: &Scope,
        registry: &ConceptRegistry,
    ) -> Result<Vec<IndexValue>, CodecError> {
        let records: Vec<Record> = {
            let inner = self.inner.read();
            let Some(files) = inner.by_key.get(key) else {
                return Ok(Vec::new());
            };
            files
                .iter()
                .filter(|file| scope.contains(file))
                .filter_map(|file| inner.files.get(file))
                .filter_map(|entries| entries.entries.get(key))
                .flat_map(|records| records.iter().cloned())
                .collect()
        };

        records
            .iter()
            .map(|record| registry.decode(record))
            .collect()
    }

    /// Stored content hash of `file`
    pub fn file_hash(&self, file: &str) -> Option<String> {
        self.inner.read().files.get(file).map(|f| f.hash.clone())
    }

    /// Indexed files, sorted
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.inner.read().files.keys().cloned().collect();
        files.sort();
        files
    }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            files: inner.files.len(),
            keys: inner.by_key.len(),
            records: inner.files.values().map(FileEntries::record_count).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().files.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.files.clear();
        inner.by_key.clear();
    }

    /// Serialize the whole store
    pub fn to_bytes(&self) -> Vec<u8> {
        let inner = self.inner.read();
        let mut files: Vec<(&String, &FileEntries)> = inner.files.iter().collect();
        files.sort_by(|a, b| a.0.cmp(b.0));

        let mut w = RecordWriter::new();
        w.write_raw(INDEX_MAGIC);
        w.write_u8(INDEX_FORMAT_VERSION);
        w.write_varint(files.len() as u32);
        for (path, entries) in files {
            w.write_str(path);
            w.write_str(&entries.hash);
            w.write_varint(entries.entries.len() as u32);
            for (key, records) in &entries.entries {
                w.write_str(key);
                w.write_varint(records.len() as u32);
                for record in records {
                    w.write_bytes(record);
                }
            }
        }
        w.into_bytes()
    }

    /// Deserialize a store, decoding every record so that an unknown tag
    /// rejects the whole file instead of surfacing at query time.
    pub fn from_bytes(bytes: &[u8], registry: &ConceptRegistry) -> Result<Self, StorageError> {
        let mut r = RecordReader::new(bytes);
        let magic = r.read_raw(INDEX_MAGIC.len()).map_err(|_| StorageError::BadMagic)?;
        if magic != INDEX_MAGIC {
            return Err(StorageError::BadMagic);
        }
        let version = r.read_u8()?;
        if version != INDEX_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: version,
                expected: INDEX_FORMAT_VERSION,
            });
        }

        let mut inner = StoreInner::default();
        let file_count = r.read_varint()?;
        for _ in 0..file_count {
            let path = r.read_string()?;
            let hash = r.read_string()?;
            let key_count = r.read_varint()?;
            let mut entries = BTreeMap::new();
            for _ in 0..key_count {
                let key = r.read_string()?;
                let record_count = r.read_varint()?;
                let mut records = Vec::with_capacity(record_count.min(1024) as usize);
                for _ in 0..record_count {
                    let record = r.read_bytes()?;
                    registry.decode(record)?;
                    records.push(Record::from(record));
                }
                entries.insert(key, records);
            }
            inner.insert_file(path, FileEntries { hash, entries });
        }
        r.finish()?;

        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Write the store to `path` through a sibling temp file and a rename
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let save_failed = |reason: String| StorageError::SaveFailed {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, self.to_bytes()).map_err(|e| save_failed(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| save_failed(e.to_string()))?;

        tracing::debug!("Saved index to {:?}", path);
        Ok(())
    }

    /// Load a store from `path`. A missing file is an empty store.
    pub fn load(path: &Path, registry: &ConceptRegistry) -> Result<Self, StorageError> {
        if !path.exists() {
            tracing::debug!("Index file not found, starting with empty index");
            return Ok(Self::new());
        }
        let bytes = fs::read(path).map_err(|e| StorageError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let store = Self::from_bytes(&bytes, registry)?;
        tracing::info!("Loaded index with {} files", store.stats().files);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassId;
    use tempfile::TempDir;

    fn ctor(name: &str) -> IndexValue {
        IndexValue::InjectedConstructor {
            class: ClassId::new("com.example", name),
        }
    }

    fn field(class: &str, name: &str) -> IndexValue {
        IndexValue::InjectedField {
            class: ClassId::new("com.example", class),
            field: name.to_string(),
        }
    }

    #[test]
    fn test_put_and_get() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        store.put("A.java", "Heater", &ctor("Heater"));
        store.put("B.java", "Heater", &field("Coffee", "heater"));

        let values = store.get("Heater", &Scope::project(), &registry).unwrap();
        assert_eq!(values, vec![ctor("Heater"), field("Coffee", "heater")]);
        assert!(store
            .get("Pump", &Scope::project(), &registry)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_put_skips_duplicate_values() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        assert!(store.put("A.java", "Heater", &ctor("Heater")));
        assert!(!store.put("A.java", "Heater", &ctor("Heater")));
        assert!(store.put("B.java", "Heater", &ctor("Heater")));

        let values = store.get("Heater", &Scope::project(), &registry).unwrap();
        assert_eq!(values, vec![ctor("Heater"), ctor("Heater")]);
        assert_eq!(store.stats().records, 2);
    }

    #[test]
    fn test_readers_never_see_partial_replacement() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        let old = vec![ctor("Heater"), field("Coffee", "heater")];
        let new = vec![ctor("Boiler"), field("Coffee", "boiler")];
        let entries = |values: &[IndexValue]| -> Vec<(String, IndexValue)> {
            values
                .iter()
                .map(|v| ("Heater".to_string(), v.clone()))
                .collect()
        };
        let (old_entries, new_entries) = (entries(&old), entries(&new));
        store.replace_file("A.java", "old", &old_entries);

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    if i % 2 == 0 {
                        store.replace_file("A.java", "new", &new_entries);
                    } else {
                        store.replace_file("A.java", "old", &old_entries);
                    }
                }
            });
            for _ in 0..500 {
                let seen = store.get("Heater", &Scope::project(), &registry).unwrap();
                assert!(seen == old || seen == new, "partial entry set: {:?}", seen);
            }
        });
    }

    #[test]
    fn test_get_respects_scope() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        store.put("A.java", "Heater", &ctor("Heater"));
        store.put("B.java", "Heater", &field("Coffee", "heater"));

        let values = store
            .get("Heater", &Scope::files(["B.java"]), &registry)
            .unwrap();
        assert_eq!(values, vec![field("Coffee", "heater")]);
    }

    #[test]
    fn test_replace_file_is_atomic_and_idempotent() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        let entries = vec![
            ("Heater".to_string(), ctor("Heater")),
            ("Heater".to_string(), ctor("Heater")),
        ];
        assert_eq!(store.replace_file("A.java", "h1", &entries), 1);
        assert_eq!(store.replace_file("A.java", "h1", &entries), 1);
        assert_eq!(store.stats().records, 1);

        store.replace_file("A.java", "h2", &[("Pump".to_string(), ctor("Pump"))]);
        assert!(store
            .get("Heater", &Scope::project(), &registry)
            .unwrap()
            .is_empty());
        assert_eq!(store.file_hash("A.java").as_deref(), Some("h2"));
        assert_eq!(store.stats().keys, 1);
    }

    #[test]
    fn test_invalidate() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        store.put("A.java", "Heater", &ctor("Heater"));
        assert!(store.invalidate("A.java"));
        assert!(!store.invalidate("A.java"));
        assert!(store
            .get("Heater", &Scope::project(), &registry)
            .unwrap()
            .is_empty());
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn test_bytes_roundtrip() {
        let registry = ConceptRegistry::new();
        let store = IndexStore::new();
        store.replace_file(
            "A.java",
            "abc",
            &[
                ("Heater".to_string(), ctor("Heater")),
                ("Pump".to_string(), field("Coffee", "pump")),
            ],
        );

        let bytes = store.to_bytes();
        assert_eq!(&bytes[..4], INDEX_MAGIC);
        assert_eq!(bytes[4], INDEX_FORMAT_VERSION);

        let loaded = IndexStore::from_bytes(&bytes, &registry).unwrap();
        assert_eq!(loaded.stats(), store.stats());
        assert_eq!(loaded.file_hash("A.java").as_deref(), Some("abc"));
        assert_eq!(
            loaded.get("Pump", &Scope::project(), &registry).unwrap(),
            vec![field("Coffee", "pump")]
        );
    }

    #[test]
    fn test_unknown_tag_is_incompatible() {
        let registry = ConceptRegistry::new();
        let mut w = RecordWriter::new();
        w.write_raw(INDEX_MAGIC);
        w.write_u8(INDEX_FORMAT_VERSION);
        w.write_varint(1);
        w.write_str("A.java");
        w.write_str("abc");
        w.write_varint(1);
        w.write_str("Heater");
        w.write_varint(1);
        w.write_bytes(&[200, 0]);

        let result = IndexStore::from_bytes(&w.into_bytes(), &registry);
        assert!(matches!(
            result,
            Err(StorageError::IncompatibleIndex(CodecError::UnknownTag(200)))
        ));
    }

    #[test]
    fn test_bad_header() {
        let registry = ConceptRegistry::new();
        assert!(matches!(
            IndexStore::from_bytes(b"NOPE\x01\x00", &registry),
            Err(StorageError::BadMagic)
        ));
        assert!(matches!(
            IndexStore::from_bytes(b"DGIX\x09\x00", &registry),
            Err(StorageError::UnsupportedVersion {
                found: 9,
                expected: 1
            })
        ));
        assert!(matches!(
            IndexStore::from_bytes(b"DG", &registry),
            Err(StorageError::BadMagic)
        ));
    }

    #[test]
    fn test_save_and_load() {
        let registry = ConceptRegistry::new();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("index.bin");

        let store = IndexStore::new();
        store.replace_file("A.java", "abc", &[("Heater".to_string(), ctor("Heater"))]);
        store.save(&path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let loaded = IndexStore::load(&path, &registry).unwrap();
        assert_eq!(loaded.files(), vec!["A.java".to_string()]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let registry = ConceptRegistry::new();
        let dir = TempDir::new().unwrap();
        let store = IndexStore::load(&dir.path().join("missing.bin"), &registry).unwrap();
        assert!(store.is_empty());
    }
}
