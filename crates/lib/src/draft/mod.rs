//! The editing session state being saved.
//!
//! A [`Draft`] holds current and original slugs, locales and flattened
//! values for one entry. Field writes go through [`Draft::set_field_value`],
//! which applies the field's i18n duplication policy explicitly.

mod fields;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::assets::AssetFolderDescriptor;
use crate::changes::Entry;
use crate::collection::{Collection, CollectionError, CollectionFile, FieldConfig, FieldI18n, I18nConfig};
use crate::consts::FALLBACK_SLUG_KEY;
use crate::types::{FlatContent, Locale, LocaleMap};

pub use fields::{FieldConfigCache, find_field, is_type_key};

/// A file attached in the editor, referenced from content by its marker
/// (for example `blob:https://cms.example.com/6f1c...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
  /// Original file name as picked by the user.
  pub name: String,
  pub data: Vec<u8>,
  pub folder: AssetFolderDescriptor,
}

/// In-memory state of one entry being edited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
  pub is_new: bool,
  #[serde(default)]
  pub is_index_file: bool,
  pub collection_name: String,
  /// Set only for file collections.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_name: Option<String>,

  #[serde(default)]
  pub current_locales: LocaleMap<bool>,
  #[serde(default)]
  pub original_locales: LocaleMap<bool>,

  /// Slugs by locale, plus the untagged `_` slot.
  #[serde(default)]
  pub current_slugs: LocaleMap<String>,
  #[serde(default)]
  pub original_slugs: LocaleMap<String>,

  #[serde(default)]
  pub current_values: LocaleMap<FlatContent>,
  #[serde(default)]
  pub original_values: LocaleMap<FlatContent>,

  /// Pending uploads keyed by marker.
  #[serde(default)]
  pub files: BTreeMap<String, PendingFile>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub original_entry: Option<Entry>,

  #[serde(skip)]
  collection: Arc<Collection>,
  #[serde(skip)]
  field_cache: FieldConfigCache,
}

impl Draft {
  /// Start a draft for a new entry, with every configured locale enabled.
  ///
  /// # Errors
  ///
  /// Fails when the collection's i18n configuration is invalid.
  pub fn new(collection: Arc<Collection>, file_name: Option<&str>) -> Result<Self, CollectionError> {
    let i18n = collection.i18n_config(file_name)?;
    let locales = &i18n.all_locales;

    Ok(Self {
      is_new: true,
      collection_name: collection.name.clone(),
      file_name: file_name.map(str::to_string),
      current_locales: locales.iter().map(|l| (l.clone(), true)).collect(),
      current_values: locales.iter().map(|l| (l.clone(), FlatContent::new())).collect(),
      collection,
      ..Default::default()
    })
  }

  /// Start a draft editing a saved entry.
  ///
  /// # Errors
  ///
  /// Fails when the collection's i18n configuration is invalid.
  pub fn from_entry(collection: Arc<Collection>, file_name: Option<&str>, entry: Entry) -> Result<Self, CollectionError> {
    let i18n = collection.i18n_config(file_name)?;

    let locales: LocaleMap<bool> = entry.locales.keys().map(|l| (l.clone(), true)).collect();
    let slugs: LocaleMap<String> = entry.locales.iter().map(|(l, e)| (l.clone(), e.slug.clone())).collect();
    let values: LocaleMap<FlatContent> = entry
      .locales
      .iter()
      .map(|(l, e)| (l.clone(), e.content.clone().unwrap_or_default()))
      .collect();
    let is_index_file = file_name.is_none() && collection.index_file_name() == Some(entry.slug.as_str());

    debug!(
      collection = %collection.name,
      slug = %entry.slug,
      locales = i18n.all_locales.len(),
      "opening entry draft"
    );

    Ok(Self {
      is_new: false,
      is_index_file,
      collection_name: collection.name.clone(),
      file_name: file_name.map(str::to_string),
      current_locales: locales.clone(),
      original_locales: locales,
      current_slugs: slugs.clone(),
      original_slugs: slugs,
      current_values: values.clone(),
      original_values: values,
      original_entry: Some(entry),
      collection,
      ..Default::default()
    })
  }

  /// Attach collection metadata to a deserialized draft.
  pub fn with_collection(mut self, collection: Arc<Collection>) -> Self {
    self.collection = collection;
    self.field_cache.invalidate();
    self
  }

  pub fn collection(&self) -> &Collection {
    &self.collection
  }

  pub fn collection_file(&self) -> Option<&CollectionFile> {
    self.file_name.as_deref().and_then(|name| self.collection.file(name))
  }

  /// Resolved i18n configuration of the draft's collection (or file).
  ///
  /// # Errors
  ///
  /// Propagates collection configuration errors.
  pub fn i18n(&self) -> Result<I18nConfig, CollectionError> {
    self.collection.i18n_config(self.file_name.as_deref())
  }

  pub fn is_locale_enabled(&self, locale: &str) -> bool {
    self.current_locales.get(locale).copied().unwrap_or(false)
  }

  pub fn was_locale_enabled(&self, locale: &str) -> bool {
    self.original_locales.get(locale).copied().unwrap_or(false)
  }

  /// Current slug of a locale, falling back to the untagged slot.
  pub fn current_slug(&self, locale: &str) -> Option<&str> {
    self
      .current_slugs
      .get(locale)
      .or_else(|| self.current_slugs.get(FALLBACK_SLUG_KEY))
      .map(String::as_str)
  }

  /// Original slug of a locale, falling back to the untagged slot.
  pub fn original_slug(&self, locale: &str) -> Option<&str> {
    self
      .original_slugs
      .get(locale)
      .or_else(|| self.original_slugs.get(FALLBACK_SLUG_KEY))
      .map(String::as_str)
  }

  pub fn set_locale_enabled(&mut self, locale: &str, enabled: bool) {
    self.current_locales.insert(locale.to_string(), enabled);
    if enabled {
      self.current_values.entry(locale.to_string()).or_default();
    }
  }

  /// Definition of the field stored at `key_path`, memoized per
  /// collection, file and key path.
  pub fn field_config(&mut self, locale: &str, key_path: &str) -> Option<FieldConfig> {
    let fields = self.collection.fields_for(self.file_name.as_deref());
    let empty = FlatContent::new();
    let values = self.current_values.get(locale).unwrap_or(&empty);

    self
      .field_cache
      .get_or_find(&self.collection.name, self.file_name.as_deref(), key_path, fields, values)
  }

  /// Write one field value and propagate it per the field's i18n policy.
  ///
  /// With `duplicate`, the value is copied to every other locale of the
  /// draft. Relation values prefixed with `<locale>/` are re-prefixed with
  /// each target locale. Writing a list item's type key drops memoized
  /// field lookups.
  pub fn set_field_value(&mut self, locale: &str, key_path: &str, value: Value) {
    let fields = self.collection.fields_for(self.file_name.as_deref());
    let type_key_write = self
      .current_values
      .get(locale)
      .is_some_and(|values| is_type_key(fields, key_path, values));

    self
      .current_values
      .entry(locale.to_string())
      .or_default()
      .insert(key_path.to_string(), value.clone());

    if type_key_write {
      debug!(key_path, "type selector changed, dropping field cache");
      self.field_cache.invalidate();
    }

    let Some(field) = self.field_config(locale, key_path) else {
      return;
    };
    if field.i18n != FieldI18n::Duplicate {
      return;
    }
    let Ok(i18n) = self.i18n() else {
      return;
    };
    if !i18n.enabled {
      return;
    }

    for target in i18n.all_locales.iter().filter(|l| l.as_str() != locale) {
      let copied = if field.is_relation() {
        relocalize(&value, locale, target)
      } else {
        value.clone()
      };
      self
        .current_values
        .entry(target.clone())
        .or_default()
        .insert(key_path.to_string(), copied);
    }
  }

  /// Locales enabled in the current draft, in configuration order.
  pub fn enabled_locales<'a>(&'a self, i18n: &'a I18nConfig) -> impl Iterator<Item = &'a Locale> + 'a {
    i18n
      .all_locales
      .iter()
      .filter(move |l| !i18n.enabled || self.is_locale_enabled(l))
  }
}

fn relocalize(value: &Value, from: &str, to: &str) -> Value {
  match value {
    Value::String(s) => match s.strip_prefix(&format!("{from}/")) {
      Some(rest) => Value::String(format!("{to}/{rest}")),
      None => value.clone(),
    },
    _ => value.clone(),
  }
}
