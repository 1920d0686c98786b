//! Key-value persistence for table view state.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use log::{trace, warn};

const KEY_PREFIX: &str = "datatable";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed storage file: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait StateStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// One storage instance shared by every table of the application.
pub type SharedStorage = Rc<RefCell<dyn StateStorage>>;

pub fn shared(storage: impl StateStorage + 'static) -> SharedStorage {
    Rc::new(RefCell::new(storage))
}

#[derive(Default, Debug, Clone)]
pub struct MemoryStorage {
    entries: IndexMap<String, String>,
}

impl MemoryStorage {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.shift_remove(key);
        Ok(())
    }
}

/// All keys in a single JSON object file, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl JsonFileStorage {
    /// A missing file starts empty, so does a corrupt one (with a warning), view state is
    /// not worth refusing to start over.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::read(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("JsonFileStorage: ignoring {path:?}: {e}");
                IndexMap::new()
            }
        };
        JsonFileStorage { path, entries }
    }

    fn read(path: &Path) -> Result<IndexMap<String, String>, StorageError> {
        if !path.exists() {
            return Ok(IndexMap::new());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;
        trace!("JsonFileStorage: wrote {} keys to {:?}", self.entries.len(), self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.shift_remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Namespace of one logical table's saved state, e.g. `["members", "view", "regular"]`.
/// Tables sharing a key overwrite each other.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PersistKey(Vec<String>);

impl PersistKey {
    pub fn new<S: fmt::Display>(segments: impl IntoIterator<Item = S>) -> Self {
        PersistKey(segments.into_iter().map(|s| s.to_string()).collect())
    }

    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn storage_key(&self) -> String {
        let mut key = KEY_PREFIX.to_string();
        for segment in &self.0 {
            key.push(':');
            push_escaped(&mut key, segment);
        }
        key
    }
}

/// Percent-encodes the separator and the escape character so segments never run together.
fn push_escaped(key: &mut String, segment: &str) {
    for c in segment.chars() {
        match c {
            '%' => key.push_str("%25"),
            ':' => key.push_str("%3A"),
            c => key.push(c),
        }
    }
}

impl fmt::Display for PersistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}
