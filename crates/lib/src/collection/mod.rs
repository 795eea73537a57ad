//! Collection metadata: i18n resolution and entry file layout.

mod paths;
mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_CANONICAL_SLUG_KEY, DEFAULT_LOCALE_KEY};
use crate::template::{FillContext, Template};
use crate::types::{FlatContent, Locale};

pub use paths::EntryLayout;
pub(crate) use paths::join as join_path;
pub use types::{
  CanonicalSlugOption, Collection, CollectionFile, FieldConfig, FieldI18n, FileFormat, FrontmatterDelimiter,
  I18nOption, I18nSettings, IndexFileOption,
};

/// Errors raised while resolving collection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
  /// The i18n structure is not one of the four supported layouts.
  #[error("unsupported i18n structure: '{0}'")]
  UnknownStructure(String),

  #[error("collection '{0}' enables i18n without any locales")]
  MissingLocales(String),

  #[error("collection '{collection}': default locale '{locale}' is not in its locales")]
  UnknownDefaultLocale { collection: String, locale: String },

  #[error("collection '{collection}' has no file named '{file}'")]
  UnknownFile { collection: String, file: String },

  #[error("collection '{0}' has neither a folder nor files")]
  MissingFolder(String),

  #[error("collection '{collection}': invalid path pattern: {message}")]
  InvalidPathPattern { collection: String, message: String },
}

/// The four multi-locale file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum I18nStructure {
  /// All locales in one file, keyed by locale.
  SingleFile,
  /// `folder/path.locale.ext`
  MultipleFiles,
  /// `folder/locale/path.ext`
  MultipleFolders,
  /// `locale/folder/path.ext`
  MultipleFoldersAtRoot,
}

impl I18nStructure {
  pub fn as_str(self) -> &'static str {
    match self {
      I18nStructure::SingleFile => "single_file",
      I18nStructure::MultipleFiles => "multiple_files",
      I18nStructure::MultipleFolders => "multiple_folders",
      I18nStructure::MultipleFoldersAtRoot => "multiple_folders_at_root",
    }
  }

  /// Whether each locale lives below its own locale folder.
  pub fn is_multiple_folders(self) -> bool {
    matches!(self, I18nStructure::MultipleFolders | I18nStructure::MultipleFoldersAtRoot)
  }
}

impl fmt::Display for I18nStructure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for I18nStructure {
  type Err = CollectionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "single_file" => Ok(I18nStructure::SingleFile),
      "multiple_files" => Ok(I18nStructure::MultipleFiles),
      "multiple_folders" => Ok(I18nStructure::MultipleFolders),
      "multiple_folders_at_root" => Ok(I18nStructure::MultipleFoldersAtRoot),
      other => Err(CollectionError::UnknownStructure(other.to_string())),
    }
  }
}

/// Canonical slug settings: the content key it is written to and the
/// template producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSlug {
  pub key: String,
  pub template: Template,
}

impl Default for CanonicalSlug {
  fn default() -> Self {
    Self {
      key: DEFAULT_CANONICAL_SLUG_KEY.to_string(),
      template: Template::slug(),
    }
  }
}

/// Resolved i18n configuration of a collection (or collection file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I18nConfig {
  pub enabled: bool,
  pub structure: I18nStructure,
  pub all_locales: Vec<Locale>,
  pub default_locale: Locale,
  pub canonical_slug: CanonicalSlug,
}

impl I18nConfig {
  /// Configuration of a collection without i18n: one pseudo-locale.
  pub fn disabled() -> Self {
    Self {
      enabled: false,
      structure: I18nStructure::SingleFile,
      all_locales: vec![DEFAULT_LOCALE_KEY.to_string()],
      default_locale: DEFAULT_LOCALE_KEY.to_string(),
      canonical_slug: CanonicalSlug::default(),
    }
  }

  /// Whether one logical entry maps to exactly one physical file.
  pub fn is_single_physical_file(&self) -> bool {
    !self.enabled || self.structure == I18nStructure::SingleFile
  }

  /// The structure in effect for path layout, `None` when i18n is off.
  pub fn active_structure(&self) -> Option<I18nStructure> {
    self.enabled.then_some(self.structure)
  }
}

impl Collection {
  /// Resolve the i18n configuration for the collection, or for one of its files.
  ///
  /// # Errors
  ///
  /// Fails on an unknown structure, an empty locale list, a default locale
  /// missing from the locales, or an unknown file name.
  pub fn i18n_config(&self, file_name: Option<&str>) -> Result<I18nConfig, CollectionError> {
    if let Some(name) = file_name {
      let file = self.file(name).ok_or_else(|| CollectionError::UnknownFile {
        collection: self.name.clone(),
        file: name.to_string(),
      })?;
      if file.i18n == Some(false) {
        return Ok(I18nConfig::disabled());
      }
    }

    let settings = match &self.i18n {
      Some(I18nOption::Settings(settings)) => settings,
      Some(I18nOption::Enabled(true)) => return Err(CollectionError::MissingLocales(self.name.clone())),
      Some(I18nOption::Enabled(false)) | None => return Ok(I18nConfig::disabled()),
    };

    if settings.locales.is_empty() {
      return Err(CollectionError::MissingLocales(self.name.clone()));
    }

    let structure = settings
      .structure
      .as_deref()
      .map(I18nStructure::from_str)
      .transpose()?
      .unwrap_or(I18nStructure::MultipleFiles);

    let default_locale = settings
      .default_locale
      .clone()
      .unwrap_or_else(|| settings.locales[0].clone());
    if !settings.locales.contains(&default_locale) {
      return Err(CollectionError::UnknownDefaultLocale {
        collection: self.name.clone(),
        locale: default_locale,
      });
    }

    let canonical = settings.canonical_slug.clone().unwrap_or_default();
    let canonical_slug = CanonicalSlug {
      key: canonical.key.unwrap_or_else(|| DEFAULT_CANONICAL_SLUG_KEY.to_string()),
      template: canonical.value.unwrap_or_else(Template::slug),
    };

    Ok(I18nConfig {
      enabled: true,
      structure,
      all_locales: settings.locales.clone(),
      default_locale,
      canonical_slug,
    })
  }

  /// A fill context for path templates of this collection.
  pub fn fill_context<'a>(&'a self, content: &'a FlatContent) -> FillContext<'a> {
    FillContext::new(content)
      .with_identifier_field(self.identifier_field())
      .with_slug_options(self.slug_options.clone())
  }

  /// A fill context for slug templates: path context plus `slug_length`.
  pub fn slug_context<'a>(&'a self, content: &'a FlatContent) -> FillContext<'a> {
    self.fill_context(content).with_max_length(self.slug_length)
  }
}
