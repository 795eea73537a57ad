//! Template filling against entry content.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Placeholder, SlugOptions, Template, TemplateError, slugify};
use crate::consts::DEFAULT_IDENTIFIER_FIELD;
use crate::types::{FlatContent, scalar_to_string};

/// Everything a template can reference while being filled.
#[derive(Debug, Clone)]
pub struct FillContext<'a> {
  /// Default-locale content.
  pub content: &'a FlatContent,
  /// Content of the locale being filled, consulted first by `localize` placeholders.
  pub localized_content: Option<&'a FlatContent>,
  /// Value of `{{slug}}`. When unset, `{{slug}}` falls back to the identifier field.
  pub current_slug: Option<&'a str>,
  pub locale: Option<&'a str>,
  pub identifier_field: &'a str,
  pub slug_options: SlugOptions,
  /// Maximum length of the filled result.
  pub max_length: Option<usize>,
  pub now: DateTime<Utc>,
  pub uuid: Uuid,
}

impl<'a> FillContext<'a> {
  pub fn new(content: &'a FlatContent) -> Self {
    Self {
      content,
      localized_content: None,
      current_slug: None,
      locale: None,
      identifier_field: DEFAULT_IDENTIFIER_FIELD,
      slug_options: SlugOptions::default(),
      max_length: None,
      now: Utc::now(),
      uuid: Uuid::new_v4(),
    }
  }

  pub fn with_current_slug(mut self, slug: Option<&'a str>) -> Self {
    self.current_slug = slug;
    self
  }

  pub fn with_locale(mut self, locale: &'a str) -> Self {
    self.locale = Some(locale);
    self
  }

  pub fn with_localized_content(mut self, content: &'a FlatContent) -> Self {
    self.localized_content = Some(content);
    self
  }

  pub fn with_identifier_field(mut self, field: &'a str) -> Self {
    self.identifier_field = field;
    self
  }

  pub fn with_slug_options(mut self, options: SlugOptions) -> Self {
    self.slug_options = options;
    self
  }

  pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
    self.max_length = max_length;
    self
  }

  pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
    self.now = now;
    self
  }
}

/// Fills a template against a [`FillContext`].
pub trait TemplateFiller {
  /// # Errors
  ///
  /// Returns [`TemplateError::MissingField`] when a referenced field cannot be
  /// found and the placeholder defines no default.
  fn fill(&self, template: &Template, ctx: &FillContext<'_>) -> Result<String, TemplateError>;
}

/// The built-in filler.
///
/// Reserved tags (`slug` when bound, `locale`, date parts, `uuid` variants)
/// are inserted verbatim; content values are slugified.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFiller;

impl TemplateFiller for StandardFiller {
  fn fill(&self, template: &Template, ctx: &FillContext<'_>) -> Result<String, TemplateError> {
    let filled = template.render(|p| resolve_placeholder(p, ctx))?;

    Ok(match ctx.max_length {
      Some(max) => truncate_slug(&filled, max, &ctx.slug_options.sanitize_replacement),
      None => filled,
    })
  }
}

enum Resolved {
  Verbatim(String),
  Field(String),
}

fn resolve_placeholder(p: &Placeholder, ctx: &FillContext<'_>) -> Result<String, TemplateError> {
  let reference = p.reference.as_str();

  let resolved = match reference {
    "slug" => match ctx.current_slug {
      Some(slug) => Resolved::Verbatim(slug.to_string()),
      None => resolve_field(p, ctx.identifier_field, ctx)?,
    },
    "locale" if ctx.locale.is_some() => Resolved::Verbatim(ctx.locale.unwrap_or_default().to_string()),
    "year" => Resolved::Verbatim(ctx.now.format("%Y").to_string()),
    "month" => Resolved::Verbatim(ctx.now.format("%m").to_string()),
    "day" => Resolved::Verbatim(ctx.now.format("%d").to_string()),
    "hour" => Resolved::Verbatim(ctx.now.format("%H").to_string()),
    "minute" => Resolved::Verbatim(ctx.now.format("%M").to_string()),
    "second" => Resolved::Verbatim(ctx.now.format("%S").to_string()),
    "uuid" => Resolved::Verbatim(ctx.uuid.to_string()),
    "uuid_short" => {
      let simple = ctx.uuid.simple().to_string();
      Resolved::Verbatim(simple[simple.len() - 12..].to_string())
    }
    "uuid_shorter" => Resolved::Verbatim(ctx.uuid.simple().to_string()[..8].to_string()),
    _ => resolve_field(p, reference.strip_prefix("fields.").unwrap_or(reference), ctx)?,
  };

  Ok(match resolved {
    Resolved::Verbatim(value) => p.apply_filters(value),
    Resolved::Field(value) => slugify(&p.apply_filters(value), &ctx.slug_options),
  })
}

fn resolve_field(p: &Placeholder, key: &str, ctx: &FillContext<'_>) -> Result<Resolved, TemplateError> {
  let localized = if p.is_localized() {
    ctx.localized_content.and_then(|c| c.get(key)).and_then(scalar_to_string)
  } else {
    None
  };
  let value = localized.or_else(|| ctx.content.get(key).and_then(scalar_to_string));

  match (value, p.default_value()) {
    (Some(v), Some(default)) if v.is_empty() => Ok(Resolved::Field(default.to_string())),
    (Some(v), _) => Ok(Resolved::Field(v)),
    (None, Some(default)) => Ok(Resolved::Field(default.to_string())),
    (None, None) => Err(TemplateError::MissingField(p.reference.clone())),
  }
}

/// Cut a slug to `max` characters without leaving a dangling separator.
fn truncate_slug(slug: &str, max: usize, replacement: &str) -> String {
  let truncated: String = slug.chars().take(max).collect();
  if replacement.is_empty() {
    return truncated;
  }
  truncated.trim_end_matches(replacement).to_string()
}
