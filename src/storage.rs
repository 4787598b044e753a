//! Client-local state: the saved feed list and the theme flag.
//!
//! Both sit on top of a [`KeyValueStore`] handed in by whoever owns the
//! application. A write that fails is logged and dropped; the in-memory
//! value still changes for the current session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;
use thiserror::Error;
use tracing::warn;

pub const SAVED_FEEDS_KEY: &str = "savedFeeds";
pub const THEME_KEY: &str = "darkMode";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Keeps everything in memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A single JSON object on disk, rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut values) => values.remove(key),
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Distinct feed URLs, most recently saved first.
pub struct SavedFeeds {
    store: Arc<dyn KeyValueStore>,
    urls: Vec<String>,
}

impl SavedFeeds {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let urls = store
            .get(SAVED_FEEDS_KEY)
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .unwrap_or_default();

        Self { store, urls }
    }

    pub fn list(&self) -> &[String] {
        &self.urls
    }

    /// Prepends `url` unless it is not an http(s) URL or is already saved.
    /// Returns whether the list changed.
    pub fn add(&mut self, url: &str) -> bool {
        let url = url.trim();
        if !is_http_url(url) || self.urls.iter().any(|u| u == url) {
            return false;
        }

        self.urls.insert(0, url.to_string());
        self.persist();
        true
    }

    pub fn remove(&mut self, url: &str) {
        self.urls.retain(|u| u != url);
        self.persist();
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.urls)
            .map_err(StorageError::from)
            .and_then(|raw| self.store.set(SAVED_FEEDS_KEY, &raw));

        if let Err(e) = result {
            warn!("Failed to persist saved feeds: {}", e);
        }
    }
}

fn is_http_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
    dark: bool,
}

impl ThemeStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let dark = store.get(THEME_KEY).as_deref() == Some("true");
        Self { store, dark }
    }

    pub fn get(&self) -> bool {
        self.dark
    }

    pub fn set(&mut self, dark: bool) {
        self.dark = dark;
        if let Err(e) = self.store.set(THEME_KEY, if dark { "true" } else { "false" }) {
            warn!("Failed to persist theme preference: {}", e);
        }
    }
}
