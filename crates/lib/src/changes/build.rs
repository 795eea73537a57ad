//! Change set construction.
//!
//! One of two strategies runs per save:
//!
//! - single file (i18n off, or `single_file`): exactly one change for the
//!   default locale's path, carrying every enabled locale when i18n is on
//! - per locale (the other structures): at most one change per configured
//!   locale, classified independently
//!
//! ```text
//! enabled now?  existed before?  slug changed?  ->  action
//! yes           no (or new)      -                  create
//! yes           yes              yes                move
//! yes           yes              no                 update
//! no            yes              -                  delete
//! no            no               -                  (none)
//! ```

use tracing::debug;
use uuid::Uuid;

use super::types::{Entry, FileAction, FileChange, FileData, LocalizedEntry};
use crate::collection::{EntryLayout, I18nConfig};
use crate::draft::Draft;
use crate::format::EntryFormatter;
use crate::save::SaveError;
use crate::slug::EntrySlugVariants;
use crate::template::{FillContext, TemplateError, TemplateFiller};
use crate::types::{FlatContent, LocaleMap};

/// The persisted entry record and the file changes producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
  pub entry: Entry,
  pub changes: Vec<FileChange>,
}

/// Everything resolved before changes are classified.
#[derive(Debug, Clone)]
pub struct ChangeSetInput<'a> {
  pub draft: &'a Draft,
  pub i18n: &'a I18nConfig,
  pub layout: &'a EntryLayout,
  pub slugs: &'a EntrySlugVariants,
  /// Default-locale fill context shared by every path of the save.
  pub base: &'a FillContext<'a>,
}

/// Build the change set of a save from normalized per-locale content.
///
/// # Errors
///
/// Fails as a whole when a path template cannot be filled, an enabled
/// locale has no content or serialization fails. No partial list is
/// returned.
pub fn build_change_set(
  input: &ChangeSetInput<'_>,
  content: &LocaleMap<FlatContent>,
  filler: &impl TemplateFiller,
) -> Result<ChangeSet, SaveError> {
  let draft = input.draft;
  let formatter = EntryFormatter::new(draft.collection(), draft.collection_file()).with_canonical_key(
    input
      .slugs
      .canonical_slug
      .as_ref()
      .map(|_| input.i18n.canonical_slug.key.as_str()),
  );

  let (locales, changes) = if input.i18n.is_single_physical_file() {
    build_single_file(input, &formatter, content, filler)?
  } else {
    build_per_locale(input, &formatter, content, filler)?
  };

  let default_locale = &input.i18n.default_locale;
  let sub_path = locales
    .get(default_locale)
    .and_then(|entry| input.layout.extract_sub_path(&entry.path))
    .unwrap_or_else(|| input.slugs.default_locale_slug.clone());

  let id = draft
    .original_entry
    .as_ref()
    .map(|entry| entry.id.clone())
    .unwrap_or_else(|| Uuid::new_v4().to_string());

  for change in &changes {
    debug!(action = ?change.action, path = %change.path, "planned change");
  }

  Ok(ChangeSet {
    entry: Entry {
      id,
      slug: input.slugs.default_locale_slug.clone(),
      sub_path,
      locales,
    },
    changes,
  })
}

type Built = (LocaleMap<LocalizedEntry>, Vec<FileChange>);

fn build_single_file(
  input: &ChangeSetInput<'_>,
  formatter: &EntryFormatter<'_>,
  content: &LocaleMap<FlatContent>,
  filler: &impl TemplateFiller,
) -> Result<Built, SaveError> {
  let draft = input.draft;
  let default_locale = &input.i18n.default_locale;
  let slug = input.slugs.default_locale_slug.as_str();
  let path = current_path(input, default_locale, filler)?;

  let (action, previous_path) = match draft.original_slug(default_locale) {
    _ if draft.is_new => (FileAction::Create, None),
    Some(original) if original != slug => (
      FileAction::Move,
      Some(original_path(input, default_locale, original, filler)?),
    ),
    _ => (FileAction::Update, None),
  };

  let enabled: Vec<_> = draft.enabled_locales(input.i18n).collect();
  let mut locales = LocaleMap::new();
  for locale in &enabled {
    let values = locale_content(content, locale)?;
    locales.insert(
      (*locale).clone(),
      LocalizedEntry {
        slug: slug.to_string(),
        path: path.clone(),
        content: Some(values.clone()),
      },
    );
  }

  let data = if input.i18n.enabled {
    let documents = enabled
      .iter()
      .map(|l| locale_content(content, l).map(|values| (*l, values)))
      .collect::<Result<Vec<_>, _>>()?;
    formatter.format_locales(documents)?
  } else {
    formatter.format_content(locale_content(content, default_locale)?)?
  };

  let change = FileChange {
    action,
    slug: slug.to_string(),
    path,
    previous_path,
    previous_hash: None,
    data: Some(FileData::Text(data)),
  };

  Ok((locales, vec![change]))
}

fn build_per_locale(
  input: &ChangeSetInput<'_>,
  formatter: &EntryFormatter<'_>,
  content: &LocaleMap<FlatContent>,
  filler: &impl TemplateFiller,
) -> Result<Built, SaveError> {
  let draft = input.draft;
  let mut locales = LocaleMap::new();
  let mut changes = Vec::new();

  for locale in &input.i18n.all_locales {
    let existed = !draft.is_new && draft.was_locale_enabled(locale);

    if draft.is_locale_enabled(locale) {
      let slug = input.slugs.for_locale(locale);
      let path = current_path(input, locale, filler)?;
      let values = locale_content(content, locale)?;

      let (action, previous_path) = match draft.original_slug(locale) {
        _ if !existed => (FileAction::Create, None),
        Some(original) if original != slug => (FileAction::Move, Some(original_path(input, locale, original, filler)?)),
        _ => (FileAction::Update, None),
      };

      changes.push(FileChange {
        action,
        slug: slug.to_string(),
        path: path.clone(),
        previous_path,
        previous_hash: None,
        data: Some(FileData::Text(formatter.format_content(values)?)),
      });
      locales.insert(
        locale.clone(),
        LocalizedEntry {
          slug: slug.to_string(),
          path,
          content: Some(values.clone()),
        },
      );
    } else if existed {
      let slug = draft.original_slug(locale).unwrap_or(input.slugs.for_locale(locale));
      changes.push(FileChange {
        action: FileAction::Delete,
        slug: slug.to_string(),
        path: original_path(input, locale, slug, filler)?,
        previous_path: None,
        previous_hash: None,
        data: None,
      });
    }
  }

  Ok((locales, changes))
}

fn locale_content<'c>(content: &'c LocaleMap<FlatContent>, locale: &str) -> Result<&'c FlatContent, SaveError> {
  content
    .get(locale)
    .ok_or_else(|| SaveError::MissingLocaleContent(locale.to_string()))
}

/// Path of `locale` after the save.
fn current_path(input: &ChangeSetInput<'_>, locale: &str, filler: &impl TemplateFiller) -> Result<String, TemplateError> {
  let draft = input.draft;
  let slug = input.slugs.for_locale(locale);
  let mut ctx = input.base.clone().with_locale(locale);
  if let Some(values) = draft.current_values.get(locale) {
    ctx = ctx.with_localized_content(values);
  }

  let sub_path = input.layout.fill_sub_path(slug, draft.is_index_file, &ctx, filler)?;
  Ok(input.layout.entry_path(locale, &sub_path))
}

/// Path of `locale` before the save: the recorded path when known,
/// otherwise recomputed from the original slug and values.
fn original_path(
  input: &ChangeSetInput<'_>,
  locale: &str,
  original_slug: &str,
  filler: &impl TemplateFiller,
) -> Result<String, TemplateError> {
  let draft = input.draft;
  let recorded = draft
    .original_entry
    .as_ref()
    .and_then(|entry| entry.locales.get(locale))
    .map(|entry| entry.path.clone());
  if let Some(path) = recorded {
    return Ok(path);
  }

  let empty = FlatContent::new();
  let default_values = draft.original_values.get(&input.i18n.default_locale).unwrap_or(&empty);
  let locale_values = draft.original_values.get(locale).unwrap_or(default_values);
  let ctx = draft
    .collection()
    .fill_context(default_values)
    .with_now(input.base.now)
    .with_locale(locale)
    .with_localized_content(locale_values);

  let sub_path = input.layout.fill_sub_path(original_slug, draft.is_index_file, &ctx, filler)?;
  Ok(input.layout.entry_path(locale, &sub_path))
}
