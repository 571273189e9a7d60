//! Metadata store service
//!
//! Blocklist metadata lives in a flat string key-value store that is handed
//! to whoever needs it. The four named records ([`ListName`]) are views over
//! that store and never share fields; callers copy between them explicitly.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::Serialize;

use crate::types::{FileType, ListName, MetadataKey};

/// Error type for metadata persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed metadata file '{path}': {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid value for '{key}': {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("Metadata store lock poisoned")]
    Poisoned,
}

/// String key-value storage shared by every blocklist record and setting.
pub trait MetadataStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Volatile store, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.write().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// Store persisted as a single JSON object, rewritten atomically on change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        log::debug!("loaded {} metadata values from '{}'", values.len(), path.display());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = values.clone();
        f(&mut next);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(values).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl MetadataStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.mutate(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let present = self
            .values
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .contains_key(key);
        if !present {
            return Ok(());
        }
        self.mutate(|values| {
            values.remove(key);
        })
    }
}

// =============================================================================
// Blocklist records
// =============================================================================

/// Snapshot of one record's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlocklistDescriptor {
    pub name: &'static str,
    pub url: Option<String>,
    pub file_type: Option<FileType>,
    pub entry_count: Option<u64>,
    pub etag: Option<String>,
}

/// One of the four named blocklist records, viewed through a store.
#[derive(Clone, Copy)]
pub struct BlocklistRecord<'a> {
    name: ListName,
    store: &'a dyn MetadataStore,
}

impl<'a> BlocklistRecord<'a> {
    pub fn new(name: ListName, store: &'a dyn MetadataStore) -> Self {
        Self { name, store }
    }

    pub fn name(&self) -> ListName {
        self.name
    }

    fn storage_key(&self, key: MetadataKey) -> String {
        format!("{}Blacklist{}", self.name.as_str(), key.as_str())
    }

    pub fn get(&self, key: MetadataKey) -> Result<Option<String>, StoreError> {
        self.store.get(&self.storage_key(key))
    }

    pub fn set(&self, key: MetadataKey, value: &str) -> Result<(), StoreError> {
        self.store.set(&self.storage_key(key), value)
    }

    pub fn remove(&self, key: MetadataKey) -> Result<(), StoreError> {
        self.store.remove(&self.storage_key(key))
    }

    pub fn remove_all(&self) -> Result<(), StoreError> {
        for key in MetadataKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }

    pub fn url(&self) -> Result<Option<String>, StoreError> {
        self.get(MetadataKey::Url)
    }

    pub fn etag(&self) -> Result<Option<String>, StoreError> {
        self.get(MetadataKey::Etag)
    }

    pub fn file_type(&self) -> Result<Option<FileType>, StoreError> {
        self.get(MetadataKey::FileType)?
            .map(|value| {
                value.parse().map_err(|_| StoreError::InvalidValue {
                    key: self.storage_key(MetadataKey::FileType),
                    value,
                })
            })
            .transpose()
    }

    pub fn entry_count(&self) -> Result<Option<u64>, StoreError> {
        self.get(MetadataKey::EntryCount)?
            .map(|value| {
                value.parse().map_err(|_| StoreError::InvalidValue {
                    key: self.storage_key(MetadataKey::EntryCount),
                    value,
                })
            })
            .transpose()
    }

    pub fn set_file_type(&self, file_type: FileType) -> Result<(), StoreError> {
        self.set(MetadataKey::FileType, file_type.as_str())
    }

    pub fn set_entry_count(&self, count: u64) -> Result<(), StoreError> {
        self.set(MetadataKey::EntryCount, &count.to_string())
    }

    /// Copy every field from `other`, removing fields `other` lacks.
    pub fn copy_from(&self, other: &BlocklistRecord<'_>) -> Result<(), StoreError> {
        for key in MetadataKey::ALL {
            match other.get(key)? {
                Some(value) => self.set(key, &value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }

    pub fn descriptor(&self) -> Result<BlocklistDescriptor, StoreError> {
        Ok(BlocklistDescriptor {
            name: self.name.as_str(),
            url: self.url()?,
            file_type: self.file_type()?,
            entry_count: self.entry_count()?,
            etag: self.etag()?,
        })
    }

    /// Overwrite every field from a descriptor.
    pub fn write_descriptor(&self, descriptor: &BlocklistDescriptor) -> Result<(), StoreError> {
        let fields = [
            (MetadataKey::Url, descriptor.url.clone()),
            (MetadataKey::FileType, descriptor.file_type.map(|t| t.as_str().to_string())),
            (MetadataKey::EntryCount, descriptor.entry_count.map(|c| c.to_string())),
            (MetadataKey::Etag, descriptor.etag.clone()),
        ];
        for (key, value) in fields {
            match value {
                Some(value) => self.set(key, &value)?,
                None => self.remove(key)?,
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for BlocklistRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlocklistRecord").field("name", &self.name).finish()
    }
}
