//! Collection configuration as produced by the configuration parser.
//!
//! These types only describe the data; resolution and validation live in
//! [`super::I18nConfig`] and [`super::EntryLayout`].

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_EXTENSION, DEFAULT_IDENTIFIER_FIELD, DEFAULT_INDEX_FILE_NAME};
use crate::template::{SlugOptions, Template};

/// An entry (folder) collection or a file collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
  pub name: String,

  /// Base folder of an entry collection.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub folder: Option<String>,

  /// Files of a file collection.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<CollectionFile>,

  /// Sub-path template below `folder`, e.g. `{{slug}}/index`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<Template>,

  /// Slug template for new entries.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slug: Option<Template>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extension: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub format: Option<FileFormat>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub frontmatter_delimiter: Option<FrontmatterDelimiter>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub identifier_field: Option<String>,

  /// Maximum slug length.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slug_length: Option<usize>,

  #[serde(default)]
  pub slug_options: SlugOptions,

  /// Sub-folder for entry-relative uploads, appended below the entry directory.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub media_folder: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub i18n: Option<I18nOption>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub index_file: Option<IndexFileOption>,

  #[serde(default)]
  pub fields: Vec<FieldConfig>,
}

impl Collection {
  /// Look up a file of a file collection.
  pub fn file(&self, name: &str) -> Option<&CollectionFile> {
    self.files.iter().find(|f| f.name == name)
  }

  pub fn identifier_field(&self) -> &str {
    self.identifier_field.as_deref().unwrap_or(DEFAULT_IDENTIFIER_FIELD)
  }

  /// The index file name, when the collection has an index file.
  pub fn index_file_name(&self) -> Option<&str> {
    match &self.index_file {
      Some(IndexFileOption::Enabled(true)) => Some(DEFAULT_INDEX_FILE_NAME),
      Some(IndexFileOption::Settings { name }) => Some(name.as_deref().unwrap_or(DEFAULT_INDEX_FILE_NAME)),
      Some(IndexFileOption::Enabled(false)) | None => None,
    }
  }

  /// The configured entry-relative media sub-folder, ignoring empty values.
  pub fn media_folder(&self) -> Option<&str> {
    self
      .media_folder
      .as_deref()
      .map(|f| f.trim_matches('/'))
      .filter(|f| !f.is_empty())
  }

  /// Field definitions for the collection, or for one of its files.
  pub fn fields_for(&self, file_name: Option<&str>) -> &[FieldConfig] {
    match file_name.and_then(|name| self.file(name)) {
      Some(file) => &file.fields,
      None => &self.fields,
    }
  }

  /// File extension for entries, or for one of the collection's files.
  pub fn extension_for(&self, file: Option<&CollectionFile>) -> String {
    if let Some(file) = file {
      return file
        .file
        .rsplit_once('.')
        .filter(|(_, ext)| !ext.contains('/'))
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    }

    match (&self.extension, self.format) {
      (Some(ext), _) => ext.trim_start_matches('.').to_string(),
      (None, Some(format)) => format.default_extension().to_string(),
      (None, None) => DEFAULT_EXTENSION.to_string(),
    }
  }

  /// Serialization format for entries, or for one of the collection's files.
  pub fn format_for(&self, file: Option<&CollectionFile>) -> FileFormat {
    file
      .and_then(|f| f.format)
      .or(self.format)
      .unwrap_or_else(|| FileFormat::from_extension(&self.extension_for(file)))
  }

  pub fn frontmatter_delimiter_for<'a>(&'a self, file: Option<&'a CollectionFile>) -> Option<&'a FrontmatterDelimiter> {
    file
      .and_then(|f| f.frontmatter_delimiter.as_ref())
      .or(self.frontmatter_delimiter.as_ref())
  }
}

/// One file of a file collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionFile {
  pub name: String,

  /// Repository path, optionally containing `{{locale}}`.
  pub file: String,

  #[serde(default)]
  pub fields: Vec<FieldConfig>,

  /// `false` turns i18n off for this file only.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub i18n: Option<bool>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub format: Option<FileFormat>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub frontmatter_delimiter: Option<FrontmatterDelimiter>,
}

/// `i18n: false` or an i18n settings block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum I18nOption {
  Enabled(bool),
  Settings(I18nSettings),
}

/// Raw i18n settings. The structure stays a string here and is checked when
/// the configuration is resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct I18nSettings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub structure: Option<String>,

  #[serde(default)]
  pub locales: Vec<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_locale: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub canonical_slug: Option<CanonicalSlugOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSlugOption {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub key: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<Template>,
}

/// `index_file: true` or `index_file: { name: ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexFileOption {
  Enabled(bool),
  Settings {
    #[serde(default)]
    name: Option<String>,
  },
}

/// Entry file serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
  Yml,
  Yaml,
  Toml,
  Json,
  Frontmatter,
  YamlFrontmatter,
  TomlFrontmatter,
  JsonFrontmatter,
}

impl FileFormat {
  pub fn from_extension(extension: &str) -> Self {
    match extension {
      "yml" | "yaml" => FileFormat::Yaml,
      "toml" => FileFormat::Toml,
      "json" => FileFormat::Json,
      _ => FileFormat::YamlFrontmatter,
    }
  }

  pub fn default_extension(self) -> &'static str {
    match self {
      FileFormat::Yml | FileFormat::Yaml => "yml",
      FileFormat::Toml => "toml",
      FileFormat::Json => "json",
      FileFormat::Frontmatter
      | FileFormat::YamlFrontmatter
      | FileFormat::TomlFrontmatter
      | FileFormat::JsonFrontmatter => DEFAULT_EXTENSION,
    }
  }

  pub fn is_frontmatter(self) -> bool {
    matches!(
      self,
      FileFormat::Frontmatter | FileFormat::YamlFrontmatter | FileFormat::TomlFrontmatter | FileFormat::JsonFrontmatter
    )
  }
}

/// Front matter delimiter: one string used on both sides, or an
/// opening/closing pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterDelimiter {
  Same(String),
  Pair([String; 2]),
}

impl FrontmatterDelimiter {
  pub fn open_close(&self) -> (&str, &str) {
    match self {
      FrontmatterDelimiter::Same(d) => (d, d),
      FrontmatterDelimiter::Pair([open, close]) => (open, close),
    }
  }
}

/// A field definition, reduced to what saving needs: names for lookup and
/// ordering, the widget kind, nesting and the i18n policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
  pub name: String,

  #[serde(default = "default_widget")]
  pub widget: String,

  #[serde(default)]
  pub i18n: FieldI18n,

  /// Sub-fields of an `object` field, or of each `list` item.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub fields: Vec<FieldConfig>,

  /// Single sub-field of a `list` whose items are plain values.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub field: Option<Box<FieldConfig>>,

  /// Variable item types of a `list`.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub types: Vec<FieldConfig>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub type_key: Option<String>,
}

fn default_widget() -> String {
  "string".to_string()
}

impl FieldConfig {
  pub fn is_list(&self) -> bool {
    self.widget == "list"
  }

  pub fn is_relation(&self) -> bool {
    self.widget == "relation"
  }
}

/// How a field behaves across locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "FieldI18nOption")]
pub enum FieldI18n {
  /// Each locale has its own value.
  Translate,
  /// Writes to one locale are copied to all others.
  Duplicate,
  /// Only the default locale carries the value.
  #[default]
  None,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldI18nOption {
  Flag(bool),
  Mode(String),
}

impl TryFrom<FieldI18nOption> for FieldI18n {
  type Error = String;

  fn try_from(option: FieldI18nOption) -> Result<Self, Self::Error> {
    match option {
      FieldI18nOption::Flag(true) => Ok(FieldI18n::Translate),
      FieldI18nOption::Flag(false) => Ok(FieldI18n::None),
      FieldI18nOption::Mode(mode) => match mode.as_str() {
        "translate" => Ok(FieldI18n::Translate),
        "duplicate" => Ok(FieldI18n::Duplicate),
        "none" => Ok(FieldI18n::None),
        other => Err(format!("unknown field i18n mode: '{other}'")),
      },
    }
  }
}
