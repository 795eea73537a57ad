//! Entry file paths for each i18n structure.
//!
//! # Layouts
//!
//! With `folder` the collection folder, `path` the filled sub-path and `ext`
//! the extension:
//!
//! ```text
//! i18n off / single_file       folder/path.ext
//! multiple_files               folder/path.locale.ext
//! multiple_folders             folder/locale/path.ext
//! multiple_folders_at_root     locale/folder/path.ext
//! ```
//!
//! File collections use their declared path, substituting `{{locale}}` or
//! deriving the per-locale variant with the same rules.

use regex::Regex;

use super::{Collection, CollectionError, I18nConfig, I18nStructure};
use crate::template::{FillContext, Template, TemplateError, TemplateFiller};

const LOCALE_TAG: &str = "{{locale}}";

/// Where the files of one collection (or collection file) live.
#[derive(Debug, Clone)]
pub struct EntryLayout {
  kind: LayoutKind,
  extension: String,
  structure: Option<I18nStructure>,
}

#[derive(Debug, Clone)]
enum LayoutKind {
  Folder {
    base_path: String,
    sub_path: Option<Template>,
    full_path_pattern: Option<Regex>,
  },
  File {
    path: String,
  },
}

impl EntryLayout {
  /// Build the layout of a collection, or of one file of a file collection.
  ///
  /// # Errors
  ///
  /// Fails when the named file does not exist, when an entry collection has
  /// no folder, or when the full-path pattern cannot be compiled.
  pub fn new(collection: &Collection, file_name: Option<&str>, i18n: &I18nConfig) -> Result<Self, CollectionError> {
    let structure = i18n.active_structure();

    if let Some(name) = file_name {
      let file = collection.file(name).ok_or_else(|| CollectionError::UnknownFile {
        collection: collection.name.clone(),
        file: name.to_string(),
      })?;
      return Ok(Self {
        kind: LayoutKind::File {
          path: file.file.trim_matches('/').to_string(),
        },
        extension: collection.extension_for(Some(file)),
        structure,
      });
    }

    let base_path = collection
      .folder
      .as_deref()
      .ok_or_else(|| CollectionError::MissingFolder(collection.name.clone()))?
      .trim_matches('/')
      .to_string();
    let extension = collection.extension_for(None);

    let full_path_pattern = match &collection.path {
      Some(_) => Some(
        Regex::new(&full_path_pattern(&base_path, &extension, structure)).map_err(|e| {
          CollectionError::InvalidPathPattern {
            collection: collection.name.clone(),
            message: e.to_string(),
          }
        })?,
      ),
      None => None,
    };

    Ok(Self {
      kind: LayoutKind::Folder {
        base_path,
        sub_path: collection.path.clone(),
        full_path_pattern,
      },
      extension,
      structure,
    })
  }

  /// The collection folder, empty for file collections.
  pub fn base_path(&self) -> &str {
    match &self.kind {
      LayoutKind::Folder { base_path, .. } => base_path,
      LayoutKind::File { .. } => "",
    }
  }

  /// The configured sub-path template, if any.
  pub fn sub_path_template(&self) -> Option<&Template> {
    match &self.kind {
      LayoutKind::Folder { sub_path, .. } => sub_path.as_ref(),
      LayoutKind::File { .. } => None,
    }
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  pub fn structure(&self) -> Option<I18nStructure> {
    self.structure
  }

  /// Fill the sub-path template for `slug`. Index files and collections
  /// without a `path` option use the slug itself.
  ///
  /// # Errors
  ///
  /// Propagates template resolution failures.
  pub fn fill_sub_path(
    &self,
    slug: &str,
    is_index_file: bool,
    ctx: &FillContext<'_>,
    filler: &impl TemplateFiller,
  ) -> Result<String, TemplateError> {
    match self.sub_path_template() {
      Some(template) if !is_index_file => filler.fill(template, &ctx.clone().with_current_slug(Some(slug))),
      _ => Ok(slug.to_string()),
    }
  }

  /// Repository path of the file holding `locale`, given a filled sub-path.
  pub fn entry_path(&self, locale: &str, sub_path: &str) -> String {
    match &self.kind {
      LayoutKind::Folder { base_path, .. } => {
        let ext = &self.extension;
        match self.structure {
          None | Some(I18nStructure::SingleFile) => join(&[base_path, &format!("{sub_path}.{ext}")]),
          Some(I18nStructure::MultipleFiles) => join(&[base_path, &format!("{sub_path}.{locale}.{ext}")]),
          Some(I18nStructure::MultipleFolders) => join(&[base_path, locale, &format!("{sub_path}.{ext}")]),
          Some(I18nStructure::MultipleFoldersAtRoot) => join(&[locale, base_path, &format!("{sub_path}.{ext}")]),
        }
      }
      LayoutKind::File { path } => file_path(path, locale, self.structure),
    }
  }

  /// Extract the sub-path of an entry from its file path using the
  /// compiled full-path pattern. `None` when the collection has no `path`
  /// option or the path does not match.
  pub fn extract_sub_path(&self, path: &str) -> Option<String> {
    match &self.kind {
      LayoutKind::Folder {
        full_path_pattern: Some(pattern),
        ..
      } => pattern
        .captures(path)
        .and_then(|c| c.name("sub_path"))
        .map(|m| m.as_str().to_string()),
      _ => None,
    }
  }
}

fn file_path(path: &str, locale: &str, structure: Option<I18nStructure>) -> String {
  if path.contains(LOCALE_TAG) {
    return path.replace(LOCALE_TAG, locale);
  }

  let (dir, name) = match path.rsplit_once('/') {
    Some((dir, name)) => (dir, name),
    None => ("", path),
  };

  match structure {
    None | Some(I18nStructure::SingleFile) => path.to_string(),
    Some(I18nStructure::MultipleFiles) => match name.rsplit_once('.') {
      Some((stem, ext)) => join(&[dir, &format!("{stem}.{locale}.{ext}")]),
      None => join(&[dir, &format!("{name}.{locale}")]),
    },
    Some(I18nStructure::MultipleFolders) => join(&[dir, locale, name]),
    Some(I18nStructure::MultipleFoldersAtRoot) => join(&[locale, path]),
  }
}

fn full_path_pattern(base_path: &str, extension: &str, structure: Option<I18nStructure>) -> String {
  let base = if base_path.is_empty() {
    String::new()
  } else {
    format!("{}/", regex::escape(base_path))
  };
  let ext = regex::escape(extension);
  let sub = "(?P<sub_path>.+?)";

  match structure {
    None | Some(I18nStructure::SingleFile) => format!("^{base}{sub}\\.{ext}$"),
    Some(I18nStructure::MultipleFiles) => format!("^{base}{sub}\\.(?P<locale>[^/.]+)\\.{ext}$"),
    Some(I18nStructure::MultipleFolders) => format!("^{base}(?P<locale>[^/]+)/{sub}\\.{ext}$"),
    Some(I18nStructure::MultipleFoldersAtRoot) => format!("^(?P<locale>[^/]+)/{base}{sub}\\.{ext}$"),
  }
}

/// Join path parts with `/`, skipping empty parts.
pub(crate) fn join(parts: &[&str]) -> String {
  parts
    .iter()
    .map(|p| p.trim_matches('/'))
    .filter(|p| !p.is_empty())
    .collect::<Vec<_>>()
    .join("/")
}
