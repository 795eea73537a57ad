//! Implementation of the `folio slug` command.

use std::path::Path;

use anyhow::{Context, Result};

use folio_lib::slug::resolve_slugs;
use folio_lib::template::StandardFiller;
use folio_lib::types::FlatContent;

use super::load_draft;
use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};

pub fn cmd_slug(collection: &Path, draft: &Path, output: OutputFormat) -> Result<()> {
  let draft = load_draft(collection, draft)?;
  let i18n = draft.i18n().context("Invalid i18n configuration")?;

  let empty = FlatContent::new();
  let values = draft.current_values.get(&i18n.default_locale).unwrap_or(&empty);
  let ctx = draft.collection().slug_context(values);
  let slugs = resolve_slugs(&draft, &i18n, &ctx, &StandardFiller).context("Failed to resolve slugs")?;

  if output.is_json() {
    return print_json(&slugs);
  }

  print_success(&format!("Slug: {}", slugs.default_locale_slug));
  if let Some(localized) = &slugs.localized_slugs {
    for (locale, slug) in localized {
      print_stat(locale, slug);
    }
  }
  match &slugs.canonical_slug {
    Some(canonical) => print_stat("canonical", canonical),
    None if i18n.enabled => print_warning("No canonical slug: slugs are shared across locales"),
    None => {}
  }

  Ok(())
}
