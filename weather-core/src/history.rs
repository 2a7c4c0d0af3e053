//! Persisted search history.
//!
//! The list lives under a single key of a small key/value [`Storage`], the way a
//! browser front end would keep it in local storage: a JSON array of city names,
//! oldest first, no two entries equal ignoring case.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    io::{self, Write},
    path::PathBuf,
};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::model::CityQuery;

pub const HISTORY_KEY: &str = "weatherHistory";

/// String key/value store with local-storage semantics.
pub trait Storage: Send + Sync + Debug {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// One file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read storage item: {}", path.display()))
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create storage directory: {}", self.dir.display())
        })?;

        let path = self.item_path(key);
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to stage storage item: {}", path.display()))?;
        tmp.write_all(value.as_bytes())
            .with_context(|| format!("Failed to write storage item: {}", path.display()))?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to replace storage item: {}", path.display()))?;

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A rendered history row; `position` is the index to pass back on activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub position: usize,
    pub city: String,
}

#[derive(Debug)]
pub struct HistoryStore<S> {
    storage: S,
}

impl<S: Storage> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Stored cities, oldest first. Missing or malformed data reads as empty.
    pub fn load(&self) -> Vec<String> {
        let raw = match self.storage.get_item(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "history unreadable, starting empty");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "history malformed, starting empty");
            Vec::new()
        })
    }

    /// Move `city` to the end of the list, dropping any entry equal to it ignoring case.
    pub fn add_city(&self, city: &CityQuery) -> Result<Vec<String>> {
        let mut history = self.load();
        history.retain(|item| !city.matches(item));
        history.push(city.as_str().to_string());

        let encoded = serde_json::to_string(&history).context("Failed to encode history")?;
        self.storage.set_item(HISTORY_KEY, &encoded)?;

        Ok(history)
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.load()
            .into_iter()
            .enumerate()
            .map(|(position, city)| HistoryEntry { position, city })
            .collect()
    }
}
