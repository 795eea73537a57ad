//! Per-locale content normalization.
//!
//! Each enabled locale's values are cleaned independently: `null` values are
//! dropped, strings are trimmed, upload markers are replaced by the final
//! asset reference and the canonical slug is injected. Uploads are resolved
//! up front into an [`UploadTable`] so the per-locale pass needs no template
//! evaluation and can run on any task.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::assets::{
  Asset, AssetPathContext, UploadNamer, resolve_asset_folder, with_collision_suffix,
};
use crate::collection::I18nConfig;
use crate::draft::Draft;
use crate::template::{TemplateError, TemplateFiller};
use crate::types::FlatContent;

const MARKER_PREFIX: &str = "blob:";

/// Pending uploads with their final names and paths, keyed by marker.
#[derive(Debug, Clone, Default)]
pub struct UploadTable {
  uploads: BTreeMap<String, Asset>,
}

impl UploadTable {
  pub fn get(&self, marker: &str) -> Option<&Asset> {
    self.uploads.get(marker)
  }
}

/// Resolve the destination of the pending uploads referenced by the content
/// of the enabled locales.
///
/// Uploads are named in order of first reference; names colliding within the
/// save get `-1`, `-2`, ... suffixes. Unreferenced uploads are skipped.
///
/// # Errors
///
/// Fails when an asset folder template cannot be filled.
pub fn resolve_uploads(
  draft: &Draft,
  i18n: &I18nConfig,
  ctx: &AssetPathContext<'_>,
  namer: &impl UploadNamer,
  filler: &impl TemplateFiller,
) -> Result<UploadTable, TemplateError> {
  let mut uploads = BTreeMap::new();
  let mut taken = HashSet::new();

  let referenced = draft
    .enabled_locales(i18n)
    .filter_map(|locale| draft.current_values.get(locale))
    .flat_map(|values| values.values())
    .filter_map(Value::as_str)
    .flat_map(find_markers);
  let mut seen = HashSet::new();

  for marker in referenced {
    if !seen.insert(marker) {
      continue;
    }
    let Some(file) = draft.files.get(marker) else {
      continue;
    };

    let folder = resolve_asset_folder(&file.folder, ctx, filler)?;
    let base_name = namer.resolve_upload_name(file, &folder);

    let mut name = base_name.clone();
    let mut n = 0;
    while !taken.insert(folder.internal_file_path(&name)) {
      n += 1;
      name = with_collision_suffix(&base_name, n);
    }

    debug!(marker = %marker, name = %name, folder = %folder.internal_path, "resolved upload");

    uploads.insert(
      marker.to_string(),
      Asset {
        path: folder.internal_file_path(&name),
        public_url: folder.public_file_path(&name),
        size: file.data.len(),
        data: file.data.clone(),
        name,
        folder,
      },
    );
  }

  Ok(UploadTable { uploads })
}

/// The cleaned values of one locale and the uploads they reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedContent {
  pub content: FlatContent,
  pub assets: Vec<Asset>,
}

/// Clean the values of one locale.
///
/// Markers without a matching upload are logged and left in place.
pub fn normalize_locale(
  locale: &str,
  values: &FlatContent,
  uploads: &UploadTable,
  canonical: Option<(&str, &str)>,
) -> NormalizedContent {
  let mut normalized = NormalizedContent::default();

  for (key, value) in values {
    let value = match value {
      Value::Null => continue,
      Value::String(text) => Value::String(replace_markers(locale, key, text.trim(), uploads, &mut normalized.assets)),
      other => other.clone(),
    };
    normalized.content.insert(key.clone(), value);
  }

  if let Some((key, slug)) = canonical {
    normalized.content.insert(key.to_string(), Value::String(slug.to_string()));
  }

  normalized
}

fn replace_markers(locale: &str, key: &str, text: &str, uploads: &UploadTable, assets: &mut Vec<Asset>) -> String {
  let spans = marker_spans(text);
  if spans.is_empty() {
    return text.to_string();
  }

  let mut result = String::with_capacity(text.len());
  let mut seen = HashSet::new();
  let mut copied = 0;

  for (start, end) in spans {
    let marker = &text[start..end];
    result.push_str(&text[copied..start]);
    copied = end;

    match uploads.get(marker) {
      Some(asset) => {
        result.push_str(&asset.public_url);
        if seen.insert(marker) {
          assets.push(asset.clone());
        }
      }
      None => {
        result.push_str(marker);
        if seen.insert(marker) {
          warn!(locale, key, marker, "unresolved upload reference left in content");
        }
      }
    }
  }

  result.push_str(&text[copied..]);
  result
}

/// Byte ranges of every upload marker in `text`, in order.
///
/// A marker runs from the prefix to the next whitespace, quote, paren,
/// angle bracket or square bracket.
fn marker_spans(text: &str) -> Vec<(usize, usize)> {
  let mut spans = Vec::new();
  let mut offset = 0;

  while let Some(start) = text[offset..].find(MARKER_PREFIX) {
    let begin = offset + start;
    let tail = &text[begin..];
    let len = tail
      .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | '<' | '>' | '[' | ']'))
      .unwrap_or(tail.len());
    if len > MARKER_PREFIX.len() {
      spans.push((begin, begin + len));
    }
    offset = begin + len.max(MARKER_PREFIX.len());
  }

  spans
}

/// Upload markers in `text`, in order of appearance, without duplicates.
fn find_markers(text: &str) -> Vec<&str> {
  let mut markers: Vec<&str> = Vec::new();
  for (start, end) in marker_spans(text) {
    let marker = &text[start..end];
    if !markers.contains(&marker) {
      markers.push(marker);
    }
  }
  markers
}

/// Merge per-locale asset lists, keeping the first record for each path.
pub fn merge_assets(lists: impl IntoIterator<Item = Vec<Asset>>) -> Vec<Asset> {
  let mut seen = HashSet::new();
  lists
    .into_iter()
    .flatten()
    .filter(|asset| seen.insert(asset.path.clone()))
    .collect()
}
