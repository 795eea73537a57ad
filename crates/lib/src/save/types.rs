use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::Asset;
use crate::changes::{Entry, FileChange};
use crate::collection::CollectionError;
use crate::format::FormatError;
use crate::slug::EntrySlugVariants;
use crate::template::{Template, TemplateError};

/// Errors that abort a save before any repository call.
#[derive(Debug, Error)]
pub enum SaveError {
  #[error(transparent)]
  Collection(#[from] CollectionError),

  /// A slug, path or message template could not be filled.
  #[error("template error: {0}")]
  Template(#[from] TemplateError),

  #[error("format error: {0}")]
  Format(#[from] FormatError),

  #[error("no content for enabled locale '{0}'")]
  MissingLocaleContent(String),

  /// A per-locale task panicked or was cancelled.
  #[error("save task failed: {0}")]
  TaskFailed(String),

  #[error("nothing to commit")]
  NoChanges,

  #[error("repository backend error: {0}")]
  Backend(#[from] BackendError),
}

/// Errors reported by a repository backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  /// A guarded file changed since its previous hash was recorded.
  #[error("conflict on {path}: file changed since it was last read")]
  Conflict { path: String },

  #[error("commit rejected: {0}")]
  Rejected(String),
}

/// Commit message templates.
///
/// Available tags: `collection`, `slug`, `path`, `locales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitMessages {
  pub create: String,
  pub update: String,
}

impl Default for CommitMessages {
  fn default() -> Self {
    Self {
      create: "Create {{collection}} “{{slug}}”".to_string(),
      update: "Update {{collection}} “{{slug}}”".to_string(),
    }
  }
}

impl CommitMessages {
  /// Render the create or update message.
  ///
  /// # Errors
  ///
  /// Fails on a malformed template or an unknown tag without default.
  pub fn render(&self, is_new: bool, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let source = if is_new { &self.create } else { &self.update };
    Template::parse(source)?.render(|p| {
      let value = vars
        .iter()
        .find(|(name, _)| *name == p.reference)
        .map(|(_, value)| value.to_string())
        .or_else(|| p.default_value().map(str::to_string))
        .ok_or_else(|| TemplateError::MissingField(p.reference.clone()))?;
      Ok(p.apply_filters(value))
    })
  }
}

/// Save settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
  /// Maximum number of per-locale tasks running at once.
  pub parallelism: usize,

  pub commit_messages: CommitMessages,

  /// Append `[skip ci]` to commit messages.
  pub skip_ci: bool,

  /// Append a short content hash to uploaded file names.
  pub hash_upload_names: bool,
}

impl Default for SaveConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      commit_messages: CommitMessages::default(),
      skip_ci: false,
      hash_upload_names: false,
    }
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// Everything a save produces before the commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutput {
  pub entry: Entry,
  pub slugs: EntrySlugVariants,
  /// Entry file changes, without uploads.
  pub changes: Vec<FileChange>,
  pub assets: Vec<Asset>,
}

impl SaveOutput {
  /// Entry changes followed by one `create` per new asset: the list handed
  /// to the backend as one transaction.
  pub fn commit_changes(&self) -> Vec<FileChange> {
    self
      .changes
      .iter()
      .cloned()
      .chain(self.assets.iter().map(|asset| asset.to_change(&self.entry.slug)))
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOptions {
  pub message: String,
}

/// Outcome of a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
  /// Commit identifier.
  pub sha: String,
  /// New content hash of every written path.
  pub files: BTreeMap<String, String>,
}

/// A Git-backed repository that applies a change list atomically.
pub trait RepositoryBackend: Send + Sync {
  /// Apply every change or none.
  fn commit_changes(
    &self,
    changes: &[FileChange],
    options: &CommitOptions,
  ) -> impl Future<Output = Result<CommitResult, BackendError>> + Send;
}

/// A committed save.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedEntry {
  pub output: SaveOutput,
  pub commit: CommitResult,
}
