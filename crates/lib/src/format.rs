//! Entry file serialization.
//!
//! Flattened values are rebuilt into nested documents (numeric key segments
//! become arrays), keys are ordered by the collection's field definitions,
//! and the document is written as YAML, TOML, JSON or a front matter file
//! with the `body` field after the closing delimiter.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::collection::{Collection, CollectionFile, FieldConfig, FileFormat, FrontmatterDelimiter};
use crate::consts::{BODY_FIELD, DEFAULT_TYPE_KEY};
use crate::types::{FlatContent, Locale, scalar_to_string};

#[derive(Debug, Error)]
pub enum FormatError {
  #[error("yaml serialization failed: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("toml serialization failed: {0}")]
  Toml(#[from] toml::ser::Error),

  #[error("json serialization failed: {0}")]
  Json(#[from] serde_json::Error),
}

/// Writes entry content in the format of one collection (or collection file).
#[derive(Debug, Clone)]
pub struct EntryFormatter<'a> {
  format: FileFormat,
  delimiter: Option<&'a FrontmatterDelimiter>,
  fields: &'a [FieldConfig],
  canonical_key: Option<&'a str>,
}

impl<'a> EntryFormatter<'a> {
  pub fn new(collection: &'a Collection, file: Option<&'a CollectionFile>) -> Self {
    Self {
      format: collection.format_for(file),
      delimiter: collection.frontmatter_delimiter_for(file),
      fields: file.map_or(collection.fields.as_slice(), |f| f.fields.as_slice()),
      canonical_key: None,
    }
  }

  /// Place `key` right after the defined fields.
  pub fn with_canonical_key(mut self, key: Option<&'a str>) -> Self {
    self.canonical_key = key;
    self
  }

  /// Serialize the content of one locale.
  ///
  /// # Errors
  ///
  /// Fails when the content cannot be represented in the target format.
  pub fn format_content(&self, content: &FlatContent) -> Result<String, FormatError> {
    let document = order_object(unflatten(content), self.fields, self.canonical_key);

    if !self.format.is_frontmatter() {
      return serialize_data(&Value::Object(document), self.format);
    }

    let mut document = document;
    let body = document
      .shift_remove(BODY_FIELD)
      .and_then(|b| scalar_to_string(&b))
      .unwrap_or_default();
    let mut out = self.front_matter(&document)?;
    if !body.is_empty() {
      out.push_str(&body);
      if !body.ends_with('\n') {
        out.push('\n');
      }
    }
    Ok(out)
  }

  /// Serialize several locales into one document keyed by locale.
  ///
  /// # Errors
  ///
  /// Fails when the content cannot be represented in the target format.
  pub fn format_locales<'c>(
    &self,
    locales: impl IntoIterator<Item = (&'c Locale, &'c FlatContent)>,
  ) -> Result<String, FormatError> {
    let document: Map<String, Value> = locales
      .into_iter()
      .map(|(locale, content)| {
        let ordered = order_object(unflatten(content), self.fields, self.canonical_key);
        (locale.clone(), Value::Object(ordered))
      })
      .collect();

    if self.format.is_frontmatter() {
      self.front_matter(&document)
    } else {
      serialize_data(&Value::Object(document), self.format)
    }
  }

  fn front_matter(&self, document: &Map<String, Value>) -> Result<String, FormatError> {
    let data_format = match self.format {
      FileFormat::TomlFrontmatter => FileFormat::Toml,
      FileFormat::JsonFrontmatter => FileFormat::Json,
      _ => FileFormat::Yaml,
    };
    let (open, close) = match (self.delimiter, data_format) {
      (Some(delimiter), _) => delimiter.open_close(),
      (None, FileFormat::Toml) => ("+++", "+++"),
      (None, FileFormat::Json) => ("{", "}"),
      (None, _) => ("---", "---"),
    };

    let inner = if document.is_empty() {
      String::new()
    } else {
      let data = serialize_data(&Value::Object(document.clone()), data_format)?;
      match data_format {
        FileFormat::Json => strip_braces(&data).to_string(),
        _ => data.trim_end().to_string(),
      }
    };

    Ok(if inner.is_empty() {
      format!("{open}\n{close}\n")
    } else {
      format!("{open}\n{inner}\n{close}\n")
    })
  }
}

fn serialize_data(value: &Value, format: FileFormat) -> Result<String, FormatError> {
  Ok(match format {
    FileFormat::Toml | FileFormat::TomlFrontmatter => toml::to_string(value)?,
    FileFormat::Json | FileFormat::JsonFrontmatter => format!("{}\n", serde_json::to_string_pretty(value)?),
    _ => serde_yaml::to_string(value)?,
  })
}

fn strip_braces(json: &str) -> &str {
  let json = json.trim();
  json
    .strip_prefix('{')
    .and_then(|s| s.strip_suffix('}'))
    .unwrap_or(json)
    .trim_matches('\n')
}

/// Rebuild nested objects and arrays from dot-delimited keys.
pub fn unflatten(content: &FlatContent) -> Map<String, Value> {
  let mut root = Map::new();
  for (key, value) in content {
    let path: Vec<&str> = key.split('.').collect();
    insert_path(&mut root, &path, value.clone());
  }

  root.into_iter().map(|(k, v)| (k, into_arrays(v))).collect()
}

fn insert_path(node: &mut Map<String, Value>, path: &[&str], value: Value) {
  match path {
    [] => {}
    [last] => {
      node.insert((*last).to_string(), value);
    }
    [head, rest @ ..] => {
      let child = node
        .entry((*head).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
      if !child.is_object() {
        *child = Value::Object(Map::new());
      }
      if let Value::Object(map) = child {
        insert_path(map, rest, value);
      }
    }
  }
}

/// Turn objects whose keys are all indices into arrays, ordered by index.
fn into_arrays(value: Value) -> Value {
  match value {
    Value::Object(map) => {
      let indexed: Option<Vec<(usize, Value)>> = map
        .iter()
        .map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v.clone())))
        .collect();

      match indexed {
        Some(mut items) if !items.is_empty() => {
          items.sort_by_key(|(i, _)| *i);
          Value::Array(items.into_iter().map(|(_, v)| into_arrays(v)).collect())
        }
        _ => Value::Object(map.into_iter().map(|(k, v)| (k, into_arrays(v))).collect()),
      }
    }
    other => other,
  }
}

/// Order keys: defined fields first, then `leading`, then the rest sorted.
fn order_object(mut map: Map<String, Value>, fields: &[FieldConfig], leading: Option<&str>) -> Map<String, Value> {
  let mut ordered = Map::new();

  for field in fields {
    if let Some(value) = map.shift_remove(&field.name) {
      ordered.insert(field.name.clone(), order_value(value, field));
    }
  }
  if let Some(key) = leading {
    if let Some(value) = map.shift_remove(key) {
      ordered.insert(key.to_string(), value);
    }
  }

  let mut rest: Vec<(String, Value)> = map.into_iter().collect();
  rest.sort_by(|(a, _), (b, _)| a.cmp(b));
  ordered.extend(rest);
  ordered
}

fn order_value(value: Value, field: &FieldConfig) -> Value {
  match value {
    Value::Object(map) => Value::Object(order_object(map, &field.fields, None)),
    Value::Array(items) => Value::Array(items.into_iter().map(|item| order_item(item, field)).collect()),
    other => other,
  }
}

fn order_item(item: Value, list: &FieldConfig) -> Value {
  let Value::Object(map) = item else {
    return item;
  };

  if !list.types.is_empty() {
    let type_key = list.type_key.as_deref().unwrap_or(DEFAULT_TYPE_KEY);
    let fields = map
      .get(type_key)
      .and_then(Value::as_str)
      .and_then(|selected| list.types.iter().find(|t| t.name == selected))
      .map_or(&[][..], |t| t.fields.as_slice());
    return Value::Object(order_object(map, fields, Some(type_key)));
  }

  match &list.field {
    Some(item_field) => order_value(Value::Object(map), item_field),
    None => Value::Object(order_object(map, &list.fields, None)),
  }
}
