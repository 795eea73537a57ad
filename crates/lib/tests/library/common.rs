//! Shared helpers for library integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use folio_lib::changes::{Entry, FileAction, FileChange, LocalizedEntry};
use folio_lib::collection::Collection;
use folio_lib::draft::Draft;
use folio_lib::sha_cache::MemoryShaCache;
use folio_lib::types::FlatContent;
use serde_json::{Value, json};

/// Parse a collection from YAML.
pub fn collection(yaml: &str) -> Arc<Collection> {
  Arc::new(serde_yaml::from_str(yaml).unwrap_or_else(|e| panic!("invalid collection yaml: {}", e)))
}

/// A new draft for an entry collection.
pub fn new_draft(yaml: &str) -> Draft {
  Draft::new(collection(yaml), None).unwrap()
}

/// Flat content from `(key, value)` pairs.
pub fn content(pairs: &[(&str, Value)]) -> FlatContent {
  pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// A saved entry whose locales all share `slug`, with paths from `path_of`.
pub fn saved_entry(slug: &str, locales: &[&str], path_of: impl Fn(&str) -> String) -> Entry {
  let locales: BTreeMap<_, _> = locales
    .iter()
    .map(|locale| {
      (
        locale.to_string(),
        LocalizedEntry {
          slug: slug.to_string(),
          path: path_of(locale),
          content: Some(content(&[("title", json!(format!("{slug} {locale}")))])),
        },
      )
    })
    .collect();

  Entry {
    id: "entry-1".to_string(),
    slug: slug.to_string(),
    sub_path: slug.to_string(),
    locales,
  }
}

pub fn empty_cache() -> Arc<MemoryShaCache> {
  Arc::new(MemoryShaCache::new())
}

/// Changes with the given action.
pub fn with_action(changes: &[FileChange], action: FileAction) -> Vec<&FileChange> {
  changes.iter().filter(|c| c.action == action).collect()
}
