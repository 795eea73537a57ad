//! Slug resolution: the default-locale slug, per-locale slugs and the
//! canonical slug linking translations of one entry.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::I18nConfig;
use crate::consts::DEFAULT_INDEX_FILE_NAME;
use crate::draft::Draft;
use crate::template::{FillContext, Template, TemplateError, TemplateFiller, slugify};
use crate::types::{FlatContent, LocaleMap};

/// Slugs of one entry, computed once per save and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySlugVariants {
  pub default_locale_slug: String,

  /// Present only when slugs differ per locale.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub localized_slugs: Option<LocaleMap<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub canonical_slug: Option<String>,
}

impl EntrySlugVariants {
  fn only(default_locale_slug: impl Into<String>) -> Self {
    Self {
      default_locale_slug: default_locale_slug.into(),
      localized_slugs: None,
      canonical_slug: None,
    }
  }

  /// Slug of `locale`: its localized slug, or the default-locale slug.
  pub fn for_locale(&self, locale: &str) -> &str {
    self
      .localized_slugs
      .as_ref()
      .and_then(|slugs| slugs.get(locale))
      .unwrap_or(&self.default_locale_slug)
  }
}

/// Resolve the slugs of a draft.
///
/// `now` and `uuid` of `base` are shared by every template evaluated for the
/// entry, so date and uuid tags agree across locales.
///
/// # Errors
///
/// Fails when a slug or canonical template references a missing field.
pub fn resolve_slugs(
  draft: &Draft,
  i18n: &I18nConfig,
  base: &FillContext<'_>,
  filler: &impl TemplateFiller,
) -> Result<EntrySlugVariants, TemplateError> {
  let collection = draft.collection();

  if draft.is_index_file {
    let name = collection.index_file_name().unwrap_or(DEFAULT_INDEX_FILE_NAME);
    return Ok(EntrySlugVariants::only(name));
  }
  if let Some(file_name) = &draft.file_name {
    return Ok(EntrySlugVariants::only(file_name.clone()));
  }

  let default_locale = i18n.default_locale.as_str();
  let template = collection.slug.clone().unwrap_or_else(Template::slug);
  let empty = FlatContent::new();
  let default_values = draft.current_values.get(default_locale).unwrap_or(&empty);

  let default_locale_slug = match (draft.is_new, draft.current_slug(default_locale)) {
    (false, Some(existing)) => existing.to_string(),
    (_, candidate) => {
      let candidate = candidate.map(|c| slugify(c, &collection.slug_options));
      let ctx = base
        .clone()
        .with_current_slug(candidate.as_deref().filter(|c| !c.is_empty()));
      filler.fill(&template, &ctx)?
    }
  };

  let localized_slugs = if !i18n.is_single_physical_file() && template.has_localized_placeholders() {
    let mut slugs = LocaleMap::new();
    for locale in draft.enabled_locales(i18n) {
      let slug = if locale == default_locale {
        default_locale_slug.clone()
      } else if let (false, Some(existing)) = (draft.is_new, draft.current_slugs.get(locale)) {
        existing.clone()
      } else {
        let values = draft.current_values.get(locale).unwrap_or(&empty);
        filler.fill(&template, &base.clone().with_localized_content(values).with_locale(locale))?
      };
      slugs.insert(locale.clone(), slug);
    }
    Some(slugs)
  } else {
    None
  };

  let canonical_slug = match &localized_slugs {
    None => None,
    Some(_) if i18n.canonical_slug.template.is_slug_sentinel() => Some(default_locale_slug.clone()),
    Some(_) => {
      let ctx = base
        .clone()
        .with_localized_content(default_values)
        .with_current_slug(Some(default_locale_slug.as_str()));
      Some(filler.fill(&i18n.canonical_slug.template, &ctx)?)
    }
  };

  debug!(
    slug = %default_locale_slug,
    localized = localized_slugs.is_some(),
    canonical = canonical_slug.is_some(),
    "resolved entry slugs"
  );

  Ok(EntrySlugVariants {
    default_locale_slug,
    localized_slugs,
    canonical_slug,
  })
}
