mod plan;
mod slug;

pub use plan::cmd_plan;
pub use slug::cmd_slug;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;

use folio_lib::collection::Collection;
use folio_lib::draft::Draft;

/// Read a YAML or JSON document, picking the parser by extension.
fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

  match path.extension().and_then(|e| e.to_str()) {
    Some("json") => serde_json::from_str(&text).with_context(|| format!("Failed to parse JSON: {}", path.display())),
    _ => serde_yaml::from_str(&text).with_context(|| format!("Failed to parse YAML: {}", path.display())),
  }
}

/// Load a collection and the draft saved against it.
fn load_draft(collection_path: &Path, draft_path: &Path) -> Result<Draft> {
  let collection: Collection = load_document(collection_path)?;
  let draft: Draft = load_document(draft_path)?;

  if draft.collection_name != collection.name {
    bail!(
      "Draft belongs to collection '{}', not '{}'",
      draft.collection_name,
      collection.name
    );
  }

  Ok(draft.with_collection(Arc::new(collection)))
}
