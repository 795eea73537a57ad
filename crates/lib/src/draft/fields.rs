//! Field definition lookup by key path.
//!
//! Key paths are the dot-delimited keys of [`FlatContent`]: `title`,
//! `authors.0.name`, `blocks.2.heading`. Numeric segments index list items;
//! items of a variable-type list pick their definition through the value of
//! the list's type key.

use std::collections::HashMap;

use crate::collection::FieldConfig;
use crate::consts::DEFAULT_TYPE_KEY;
use crate::types::FlatContent;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FieldKey {
  collection: String,
  file: Option<String>,
  key_path: String,
}

/// Memoized field lookups keyed by `(collection, file, key path)`.
///
/// Results for variable-type list items depend on the selected type, so the
/// cache must be cleared whenever a type key is written.
#[derive(Debug, Clone, Default)]
pub struct FieldConfigCache {
  entries: HashMap<FieldKey, Option<FieldConfig>>,
}

impl FieldConfigCache {
  pub fn get_or_find(
    &mut self,
    collection: &str,
    file: Option<&str>,
    key_path: &str,
    fields: &[FieldConfig],
    values: &FlatContent,
  ) -> Option<FieldConfig> {
    let key = FieldKey {
      collection: collection.to_string(),
      file: file.map(str::to_string),
      key_path: key_path.to_string(),
    };

    self
      .entries
      .entry(key)
      .or_insert_with(|| find_field(fields, key_path, values).cloned())
      .clone()
  }

  pub fn invalidate(&mut self) {
    self.entries.clear();
  }
}

enum Cursor<'a> {
  Fields(&'a [FieldConfig]),
  Field(&'a FieldConfig),
}

/// Find the definition of the field stored at `key_path`.
pub fn find_field<'a>(fields: &'a [FieldConfig], key_path: &str, values: &FlatContent) -> Option<&'a FieldConfig> {
  let mut cursor = Cursor::Fields(fields);
  let mut prefix = String::new();

  for segment in key_path.split('.') {
    cursor = match cursor {
      Cursor::Fields(fields) => Cursor::Field(fields.iter().find(|f| f.name == segment)?),
      Cursor::Field(field) if segment.parse::<usize>().is_ok() => {
        if !field.types.is_empty() {
          let type_key = field.type_key.as_deref().unwrap_or(DEFAULT_TYPE_KEY);
          let selected = values.get(&format!("{prefix}.{segment}.{type_key}"))?.as_str()?;
          Cursor::Fields(&field.types.iter().find(|t| t.name == selected)?.fields)
        } else if let Some(item) = &field.field {
          Cursor::Field(item)
        } else if field.is_list() {
          Cursor::Fields(&field.fields)
        } else {
          // Multi-value widgets (relation, select) flatten into indexed keys.
          Cursor::Field(field)
        }
      }
      Cursor::Field(field) => Cursor::Field(field.fields.iter().find(|f| f.name == segment)?),
    };

    if !prefix.is_empty() {
      prefix.push('.');
    }
    prefix.push_str(segment);
  }

  match cursor {
    Cursor::Field(field) => Some(field),
    Cursor::Fields(_) => None,
  }
}

/// Whether writing `key_path` changes the selected type of a list item.
pub fn is_type_key(fields: &[FieldConfig], key_path: &str, values: &FlatContent) -> bool {
  let Some((item_path, last)) = key_path.rsplit_once('.') else {
    return false;
  };
  let Some((list_path, index)) = item_path.rsplit_once('.') else {
    return false;
  };
  if index.parse::<usize>().is_err() {
    return false;
  }

  find_field(fields, list_path, values)
    .is_some_and(|list| !list.types.is_empty() && list.type_key.as_deref().unwrap_or(DEFAULT_TYPE_KEY) == last)
}
