//! Save orchestration.
//!
//! # Pipeline
//!
//! ```text
//! Draft
//!   -> resolve_slugs                  default, localized, canonical slugs
//!   -> resolve_uploads                final names of pending files
//!   -> normalize_locale (per locale)  parallel tasks, merged afterwards
//!   -> build_change_set               entry record + file changes
//!   -> attach_previous_hashes         concurrent cache lookups
//!   -> RepositoryBackend::commit_changes (save_draft only)
//! ```
//!
//! Any failure before the commit aborts the save with no change emitted.

mod types;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::assets::{AssetPathContext, DefaultNamer, UploadNamer};
use crate::changes::{ChangeSetInput, FileAction, FileChange, attach_previous_hashes, build_change_set};
use crate::collection::EntryLayout;
use crate::content::{NormalizedContent, merge_assets, normalize_locale, resolve_uploads};
use crate::draft::Draft;
use crate::sha_cache::ShaCache;
use crate::slug::resolve_slugs;
use crate::template::{StandardFiller, TemplateFiller};
use crate::types::{FlatContent, LocaleMap};

pub use types::{
  BackendError, CommitMessages, CommitOptions, CommitResult, RepositoryBackend, SaveConfig, SaveError, SaveOutput,
  SavedEntry,
};

/// Compute everything a save writes, without touching the repository.
///
/// # Errors
///
/// Returns the first error of any stage; nothing partial is returned.
pub async fn prepare_save<C>(draft: &Draft, config: &SaveConfig, cache: Arc<C>) -> Result<SaveOutput, SaveError>
where
  C: ShaCache + 'static,
{
  let namer = DefaultNamer {
    slug_options: draft.collection().slug_options.clone(),
    append_hash: config.hash_upload_names,
  };
  prepare_save_with(draft, config, cache, &StandardFiller, &namer).await
}

/// [`prepare_save`] with a custom template filler and upload namer.
///
/// # Errors
///
/// Returns the first error of any stage; nothing partial is returned.
pub async fn prepare_save_with<C, F, N>(
  draft: &Draft,
  config: &SaveConfig,
  cache: Arc<C>,
  filler: &F,
  namer: &N,
) -> Result<SaveOutput, SaveError>
where
  C: ShaCache + 'static,
  F: TemplateFiller + Sync,
  N: UploadNamer + Sync,
{
  let collection = draft.collection();
  let i18n = draft.i18n()?;
  let layout = EntryLayout::new(collection, draft.file_name.as_deref(), &i18n)?;

  let empty = FlatContent::new();
  let default_values = draft.current_values.get(&i18n.default_locale).unwrap_or(&empty);
  let base = collection.fill_context(default_values);

  let slugs = resolve_slugs(
    draft,
    &i18n,
    &base.clone().with_max_length(collection.slug_length),
    filler,
  )?;

  let asset_ctx = AssetPathContext {
    collection,
    layout: &layout,
    fill: base.clone().with_current_slug(Some(slugs.default_locale_slug.as_str())),
    slug: &slugs.default_locale_slug,
    is_index_file: draft.is_index_file,
  };
  let uploads = Arc::new(resolve_uploads(draft, &i18n, &asset_ctx, namer, filler)?);

  let canonical = slugs
    .canonical_slug
    .clone()
    .map(|slug| (i18n.canonical_slug.key.clone(), slug));
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut join_set = JoinSet::new();

  for locale in draft.enabled_locales(&i18n) {
    let locale = locale.clone();
    let values = draft
      .current_values
      .get(&locale)
      .cloned()
      .ok_or_else(|| SaveError::MissingLocaleContent(locale.clone()))?;
    let uploads = Arc::clone(&uploads);
    let canonical = canonical.clone();
    let semaphore = Arc::clone(&semaphore);

    join_set.spawn(async move {
      let _permit = semaphore
        .acquire()
        .await
        .map_err(|e| SaveError::TaskFailed(e.to_string()))?;

      let canonical = canonical.as_ref().map(|(key, slug)| (key.as_str(), slug.as_str()));
      let normalized = normalize_locale(&locale, &values, &uploads, canonical);
      Ok::<_, SaveError>((locale, normalized))
    });
  }

  let mut content = LocaleMap::new();
  let mut asset_lists = LocaleMap::new();
  while let Some(join_result) = join_set.join_next().await {
    let (locale, NormalizedContent { content: values, assets }) =
      join_result.map_err(|e| SaveError::TaskFailed(e.to_string()))??;
    debug!(locale = %locale, keys = values.len(), assets = assets.len(), "normalized locale");
    content.insert(locale.clone(), values);
    asset_lists.insert(locale, assets);
  }
  let assets = merge_assets(asset_lists.into_values());

  let input = ChangeSetInput {
    draft,
    i18n: &i18n,
    layout: &layout,
    slugs: &slugs,
    base: &base,
  };
  let mut change_set = build_change_set(&input, &content, filler)?;
  attach_previous_hashes(&mut change_set.changes, cache).await;

  info!(
    collection = %collection.name,
    slug = %slugs.default_locale_slug,
    changes = change_set.changes.len(),
    assets = assets.len(),
    "prepared save"
  );

  Ok(SaveOutput {
    entry: change_set.entry,
    slugs,
    changes: change_set.changes,
    assets,
  })
}

/// Save a draft: prepare the change set and commit it in one transaction,
/// then refresh the cache with the hashes the backend reports.
///
/// # Errors
///
/// Fails before any repository call when preparation fails, and with
/// [`SaveError::Backend`] when the commit is refused.
pub async fn save_draft<C, B>(
  draft: &Draft,
  config: &SaveConfig,
  cache: Arc<C>,
  backend: &B,
) -> Result<SavedEntry, SaveError>
where
  C: ShaCache + 'static,
  B: RepositoryBackend,
{
  let output = prepare_save(draft, config, Arc::clone(&cache)).await?;
  let changes = output.commit_changes();
  if changes.is_empty() {
    return Err(SaveError::NoChanges);
  }

  let message = commit_message(draft, &output, config)?;
  info!(message = %message, changes = changes.len(), "committing");
  let commit = backend.commit_changes(&changes, &CommitOptions { message }).await?;

  if let Err(e) = cache.update(cache_updates(&changes, &commit)).await {
    warn!(error = %e, "failed to refresh sha cache after commit");
  }

  Ok(SavedEntry { output, commit })
}

/// Render the commit message for a prepared save.
///
/// # Errors
///
/// Fails when a message template is malformed or references an unknown tag.
pub fn commit_message(draft: &Draft, output: &SaveOutput, config: &SaveConfig) -> Result<String, SaveError> {
  let locales = output.entry.locales.keys().cloned().collect::<Vec<_>>().join(", ");
  let path = output
    .changes
    .first()
    .map(|c| c.path.as_str())
    .or_else(|| output.assets.first().map(|a| a.path.as_str()))
    .unwrap_or_default();
  let vars = [
    ("collection", draft.collection_name.as_str()),
    ("slug", output.entry.slug.as_str()),
    ("path", path),
    ("locales", locales.as_str()),
  ];

  let mut message = config.commit_messages.render(draft.is_new, &vars)?;
  if config.skip_ci {
    message.push_str(" [skip ci]");
  }
  Ok(message)
}

/// New cache entries after a commit: written paths take the reported hash,
/// removed and moved-away paths are forgotten.
fn cache_updates(changes: &[FileChange], commit: &CommitResult) -> Vec<(String, Option<String>)> {
  let mut updates = Vec::new();
  for change in changes {
    match change.action {
      FileAction::Delete => updates.push((change.path.clone(), None)),
      FileAction::Move => {
        if let Some(previous) = &change.previous_path {
          updates.push((previous.clone(), None));
        }
        updates.push((change.path.clone(), commit.files.get(&change.path).cloned()));
      }
      FileAction::Create | FileAction::Update => {
        updates.push((change.path.clone(), commit.files.get(&change.path).cloned()));
      }
    }
  }
  updates
}
