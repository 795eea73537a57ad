use serde::{Deserialize, Serialize};

use crate::types::{FlatContent, LocaleMap};

/// The operation applied to one repository file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
  Create,
  Update,
  Move,
  Delete,
}

impl FileAction {
  pub fn as_str(self) -> &'static str {
    match self {
      FileAction::Create => "create",
      FileAction::Update => "update",
      FileAction::Move => "move",
      FileAction::Delete => "delete",
    }
  }
}

/// Serialized file payload: entry text or upload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileData {
  Text(String),
  Binary(Vec<u8>),
}

impl FileData {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      FileData::Text(text) => Some(text),
      FileData::Binary(_) => None,
    }
  }
}

/// One physical file operation. The ordered list of changes for a save is
/// committed as a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
  pub action: FileAction,
  pub slug: String,

  /// Target path. For `delete`, the path being removed.
  pub path: String,

  /// Source path of a `move`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_path: Option<String>,

  /// Last known hash of the file being replaced or removed.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub previous_hash: Option<String>,

  /// Absent only for `delete`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<FileData>,
}

impl FileChange {
  /// The path whose last known hash guards this change, if any.
  ///
  /// A `move` is guarded by its source, `update` and `delete` by their own
  /// path, `create` by nothing.
  pub fn guarded_path(&self) -> Option<&str> {
    match self.action {
      FileAction::Create => None,
      FileAction::Move => self.previous_path.as_deref(),
      FileAction::Update | FileAction::Delete => Some(&self.path),
    }
  }
}

/// The persisted record of a saved entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
  /// Generated at first save, stable afterwards.
  pub id: String,
  pub slug: String,
  pub sub_path: String,
  pub locales: LocaleMap<LocalizedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedEntry {
  pub slug: String,
  pub path: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<FlatContent>,
}
