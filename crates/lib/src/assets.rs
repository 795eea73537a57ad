//! Upload destinations: resolving asset folders and naming uploaded files.
//!
//! An asset folder is either a fixed site-wide location, possibly holding
//! template tags such as `{{slug}}`, or entry-relative: next to the entry's
//! own file, below the collection folder.
//!
//! # Entry-relative folders
//!
//! The internal path is `folder/<entry dir>[/media_folder]`, where the entry
//! dir is the filled sub-path without a trailing index file name. When each
//! locale lives in its own folder, the public path climbs out of the locale
//! directory with one `../` per sub-path segment and then descends into the
//! entry dir:
//!
//! ```text
//! path: {{slug}}         public: ../foo
//! path: {{slug}}/index   public: ../../foo
//! ```
//!
//! Other structures keep the descriptor's public path, empty by convention,
//! since assets sit next to the entry.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::changes::{FileAction, FileChange, FileData};
use crate::collection::{Collection, EntryLayout};
use crate::consts::UPLOAD_HASH_LEN;
use crate::draft::PendingFile;
use crate::template::{FillContext, SlugOptions, Template, TemplateError, TemplateFiller, slugify};

const INDEX_NAMES: [&str; 2] = ["index", "_index"];

/// Where a media field's uploads go. Paths may hold unresolved template tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFolderDescriptor {
  pub internal_path: String,
  pub public_path: String,
  #[serde(default)]
  pub entry_relative: bool,
  #[serde(default)]
  pub has_template_tags: bool,
}

impl AssetFolderDescriptor {
  /// A site-wide folder. Template tags are detected from the paths.
  pub fn global(internal_path: impl Into<String>, public_path: impl Into<String>) -> Self {
    let internal_path = internal_path.into();
    let public_path = public_path.into();
    let has_template_tags = internal_path.contains("{{") || public_path.contains("{{");
    Self {
      internal_path,
      public_path,
      entry_relative: false,
      has_template_tags,
    }
  }

  /// A folder next to the entry file.
  pub fn entry_relative() -> Self {
    Self {
      internal_path: String::new(),
      public_path: String::new(),
      entry_relative: true,
      has_template_tags: false,
    }
  }
}

/// An asset folder with every tag filled in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAssetFolder {
  pub internal_path: String,
  pub public_path: String,
}

impl ResolvedAssetFolder {
  /// Repository path of a file named `name` in this folder.
  pub fn internal_file_path(&self, name: &str) -> String {
    join_public(&self.internal_path, name)
  }

  /// Text written into content to reference a file named `name`.
  pub fn public_file_path(&self, name: &str) -> String {
    join_public(&self.public_path, name)
  }
}

fn join_public(dir: &str, name: &str) -> String {
  if dir.is_empty() {
    name.to_string()
  } else {
    format!("{}/{}", dir.trim_end_matches('/'), name)
  }
}

/// The entry an asset folder is resolved for.
#[derive(Debug, Clone)]
pub struct AssetPathContext<'a> {
  pub collection: &'a Collection,
  pub layout: &'a EntryLayout,
  /// Default-locale fill context with the entry slug bound.
  pub fill: FillContext<'a>,
  pub slug: &'a str,
  pub is_index_file: bool,
}

/// Resolve the internal and public paths of an asset folder for an entry.
///
/// Pure: the same inputs always give the same result.
///
/// # Errors
///
/// Fails when a folder template is malformed or references a missing field.
pub fn resolve_asset_folder(
  folder: &AssetFolderDescriptor,
  ctx: &AssetPathContext<'_>,
  filler: &impl TemplateFiller,
) -> Result<ResolvedAssetFolder, TemplateError> {
  if !folder.entry_relative {
    return Ok(ResolvedAssetFolder {
      internal_path: fill_tags(&folder.internal_path, folder.has_template_tags, ctx, filler)?,
      public_path: fill_tags(&folder.public_path, folder.has_template_tags, ctx, filler)?,
    });
  }

  let sub_path = ctx.layout.fill_sub_path(ctx.slug, ctx.is_index_file, &ctx.fill, filler)?;
  let entry_dir = entry_dir(&sub_path, ctx.collection.index_file_name());

  let internal_path = crate::collection::join_path(&[
    ctx.layout.base_path(),
    entry_dir,
    ctx.collection.media_folder().unwrap_or_default(),
  ]);

  let public_path = match ctx.layout.structure() {
    Some(structure) if structure.is_multiple_folders() => {
      let depth = ctx.layout.sub_path_template().map_or(1, Template::path_depth);
      format!("{}{}", "../".repeat(depth), entry_dir)
    }
    _ => fill_tags(&folder.public_path, folder.has_template_tags, ctx, filler)?,
  };

  Ok(ResolvedAssetFolder {
    internal_path,
    public_path,
  })
}

fn fill_tags(
  path: &str,
  has_tags: bool,
  ctx: &AssetPathContext<'_>,
  filler: &impl TemplateFiller,
) -> Result<String, TemplateError> {
  if !has_tags {
    return Ok(path.to_string());
  }
  filler.fill(&Template::parse(path)?, &ctx.fill)
}

/// The filled sub-path without a trailing index file name.
fn entry_dir<'a>(sub_path: &'a str, index_name: Option<&str>) -> &'a str {
  let (dir, last) = match sub_path.rsplit_once('/') {
    Some((dir, last)) => (dir, last),
    None => ("", sub_path),
  };
  if INDEX_NAMES.contains(&last) || index_name == Some(last) {
    dir
  } else {
    sub_path
  }
}

/// Picks the file name an upload is stored under.
pub trait UploadNamer {
  fn resolve_upload_name(&self, file: &PendingFile, folder: &ResolvedAssetFolder) -> String;
}

/// Slugified stem plus lowercased extension, optionally suffixed with a
/// short content hash.
#[derive(Debug, Clone, Default)]
pub struct DefaultNamer {
  pub slug_options: SlugOptions,
  pub append_hash: bool,
}

impl UploadNamer for DefaultNamer {
  fn resolve_upload_name(&self, file: &PendingFile, _folder: &ResolvedAssetFolder) -> String {
    let (stem, extension) = match file.name.rsplit_once('.') {
      Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_lowercase())),
      _ => (file.name.as_str(), None),
    };

    let mut stem = slugify(stem, &self.slug_options);
    if stem.is_empty() {
      stem = "file".to_string();
    }
    if self.append_hash {
      let digest = hex::encode(Sha256::digest(&file.data));
      stem = format!("{stem}-{}", &digest[..UPLOAD_HASH_LEN]);
    }

    match extension {
      Some(ext) => format!("{stem}.{ext}"),
      None => stem,
    }
  }
}

/// Insert `-n` before the extension of `name`.
pub fn with_collision_suffix(name: &str, n: usize) -> String {
  match name.rsplit_once('.') {
    Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
    _ => format!("{name}-{n}"),
  }
}

/// A new file created by a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
  pub name: String,
  /// Repository path.
  pub path: String,
  /// Reference written into content in place of the upload marker.
  pub public_url: String,
  pub folder: ResolvedAssetFolder,
  pub size: usize,
  #[serde(skip)]
  pub data: Vec<u8>,
}

impl Asset {
  /// The `create` change committing this asset.
  pub fn to_change(&self, slug: &str) -> FileChange {
    FileChange {
      action: FileAction::Create,
      slug: slug.to_string(),
      path: self.path.clone(),
      previous_path: None,
      previous_hash: None,
      data: Some(FileData::Binary(self.data.clone())),
    }
  }
}
