//! Last known content hashes of repository files.
//!
//! Changes carry the previous hash of the file they replace so the backend
//! can refuse blind overwrites. A missing hash is not an error: the write is
//! simply not conflict-checked.
//!
//! # Storage Layout
//!
//! [`FileShaCache`] keeps one JSON index:
//!
//! ```text
//! {
//!   "version": 1,
//!   "entries": { "content/posts/foo.md": "9b2c..." }
//! }
//! ```

use std::collections::BTreeMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::consts::SHA_CACHE_VERSION;

#[derive(Debug, Error)]
pub enum ShaCacheError {
  #[error("failed to read cache index: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write cache index: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse cache index: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize cache index: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("unsupported cache index version: {0}")]
  UnsupportedVersion(u32),
}

/// Path to hash lookup consulted before a commit and refreshed after it.
pub trait ShaCache: Send + Sync {
  /// The last known hash of `path`. Never fails: problems are misses.
  fn previous_hash(&self, path: &str) -> impl Future<Output = Option<String>> + Send;

  /// Record new hashes; `None` forgets a path.
  fn update(&self, updates: Vec<(String, Option<String>)>) -> impl Future<Output = Result<(), ShaCacheError>> + Send;
}

/// In-memory cache.
#[derive(Debug, Default)]
pub struct MemoryShaCache {
  entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryShaCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
    Self {
      entries: RwLock::new(entries.into_iter().collect()),
    }
  }

  pub async fn len(&self) -> usize {
    self.entries.read().await.len()
  }
}

impl ShaCache for MemoryShaCache {
  async fn previous_hash(&self, path: &str) -> Option<String> {
    self.entries.read().await.get(path).cloned()
  }

  async fn update(&self, updates: Vec<(String, Option<String>)>) -> Result<(), ShaCacheError> {
    let mut entries = self.entries.write().await;
    apply(&mut entries, updates);
    Ok(())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ShaIndex {
  version: u32,
  entries: BTreeMap<String, String>,
}

impl Default for ShaIndex {
  fn default() -> Self {
    Self {
      version: SHA_CACHE_VERSION,
      entries: BTreeMap::new(),
    }
  }
}

/// Cache persisted as a JSON index file, loaded on first use.
///
/// A missing file is an empty cache. Writes go to a temporary file that is
/// renamed over the index.
#[derive(Debug)]
pub struct FileShaCache {
  path: PathBuf,
  index: RwLock<Option<ShaIndex>>,
}

impl FileShaCache {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      index: RwLock::new(None),
    }
  }

  async fn load(&self) -> Result<ShaIndex, ShaCacheError> {
    let content = match fs::read_to_string(&self.path).await {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ShaIndex::default()),
      Err(e) => return Err(ShaCacheError::Read(e)),
    };

    let index: ShaIndex = serde_json::from_str(&content).map_err(ShaCacheError::Parse)?;
    if index.version != SHA_CACHE_VERSION {
      return Err(ShaCacheError::UnsupportedVersion(index.version));
    }

    debug!(path = %self.path.display(), entries = index.entries.len(), "loaded sha cache");
    Ok(index)
  }

  async fn save(&self, index: &ShaIndex) -> Result<(), ShaCacheError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).await.map_err(ShaCacheError::Write)?;
    }

    let mut temp_name = self.path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let content = serde_json::to_string_pretty(index).map_err(ShaCacheError::Serialize)?;
    fs::write(&temp_path, &content).await.map_err(ShaCacheError::Write)?;
    fs::rename(&temp_path, &self.path).await.map_err(ShaCacheError::Write)?;

    Ok(())
  }
}

impl ShaCache for FileShaCache {
  async fn previous_hash(&self, path: &str) -> Option<String> {
    if let Some(index) = self.index.read().await.as_ref() {
      return index.entries.get(path).cloned();
    }

    let mut guard = self.index.write().await;
    if guard.is_none() {
      match self.load().await {
        Ok(index) => *guard = Some(index),
        Err(e) => {
          warn!(error = %e, path = %self.path.display(), "sha cache unavailable, treating as miss");
          return None;
        }
      }
    }
    guard.as_ref().and_then(|index| index.entries.get(path).cloned())
  }

  async fn update(&self, updates: Vec<(String, Option<String>)>) -> Result<(), ShaCacheError> {
    let mut guard = self.index.write().await;
    let mut index = match guard.take() {
      Some(index) => index,
      None => self.load().await?,
    };

    apply(&mut index.entries, updates);
    let result = self.save(&index).await;
    *guard = Some(index);
    result
  }
}

fn apply(entries: &mut BTreeMap<String, String>, updates: Vec<(String, Option<String>)>) {
  for (path, hash) in updates {
    match hash {
      Some(hash) => {
        entries.insert(path, hash);
      }
      None => {
        entries.remove(&path);
      }
    }
  }
}
