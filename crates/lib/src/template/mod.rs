//! Placeholder templates for slugs, entry paths and commit messages.
//!
//! Templates are parsed once, when configuration is loaded, into a list of
//! literal and placeholder segments. Filling a template walks the segments
//! and never re-scans the source string.
//!
//! # Grammar
//!
//! - Literal text passes through unchanged.
//! - `{{reference}}` inserts the value named by `reference`, which is a
//!   reserved tag (`slug`, `locale`, `year`, `uuid`, ...) or a content key.
//!   `fields.<key>` always addresses content.
//! - `{{reference | filter | filter}}` applies filters left to right.
//!
//! # Filters
//!
//! - `localize` - take the value from the locale being filled
//! - `upper`, `lower`, `trim` - string transforms
//! - `default('text')` - value used when the reference resolves to nothing
//! - `truncate(N)` - keep at most N characters
//!
//! # Example
//!
//! ```
//! use folio_lib::template::{Filter, Placeholder, Segment, Template};
//!
//! let template = Template::parse("{{year}}/{{title | localize}}").unwrap();
//! assert_eq!(template.segments()[1], Segment::Literal("/".to_string()));
//! assert_eq!(
//!   template.segments()[2],
//!   Segment::Placeholder(Placeholder {
//!     reference: "title".to_string(),
//!     filters: vec![Filter::Localize],
//!   })
//! );
//! assert!(template.has_localized_placeholders());
//! ```

mod fill;
mod slugify;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::CANONICAL_SLUG_SENTINEL;

pub use fill::{FillContext, StandardFiller, TemplateFiller};
pub use slugify::{SlugEncoding, SlugOptions, slugify};

/// A transformation applied to a placeholder value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  /// `localize` - resolve against the locale being filled.
  Localize,
  /// `upper`
  Upper,
  /// `lower`
  Lower,
  /// `trim`
  Trim,
  /// `default('text')` - fallback when the reference resolves to nothing.
  Default(String),
  /// `truncate(N)`
  Truncate(usize),
}

/// A parsed `{{reference | filter}}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
  pub reference: String,
  pub filters: Vec<Filter>,
}

impl Placeholder {
  /// Whether the placeholder carries the `localize` modifier.
  pub fn is_localized(&self) -> bool {
    self.filters.contains(&Filter::Localize)
  }

  /// The `default(...)` fallback, if any.
  pub fn default_value(&self) -> Option<&str> {
    self.filters.iter().find_map(|f| match f {
      Filter::Default(value) => Some(value.as_str()),
      _ => None,
    })
  }

  /// Apply the string transforms in order. `localize` and `default` are
  /// handled during lookup and are no-ops here.
  pub fn apply_filters(&self, value: String) -> String {
    self.filters.iter().fold(value, |acc, filter| match filter {
      Filter::Upper => acc.to_uppercase(),
      Filter::Lower => acc.to_lowercase(),
      Filter::Trim => acc.trim().to_string(),
      Filter::Truncate(n) => acc.chars().take(*n).collect(),
      Filter::Localize | Filter::Default(_) => acc,
    })
  }
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Errors raised while parsing or filling a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unclosed placeholder at position {0}")]
  Unclosed(usize),

  #[error("empty placeholder at position {0}")]
  Empty(usize),

  #[error("invalid field reference: '{0}'")]
  InvalidReference(String),

  #[error("unknown filter: '{0}'")]
  UnknownFilter(String),

  #[error("malformed filter: '{0}'")]
  MalformedFilter(String),

  /// A referenced field is absent from the content and has no default.
  #[error("cannot resolve '{0}': field not found and no default given")]
  MissingField(String),
}

/// A template string, tokenized at construction.
///
/// Serializes as its source string; deserializing parses it, so malformed
/// templates are rejected when configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
  source: String,
  segments: Vec<Segment>,
}

impl Template {
  /// Parse a template string.
  ///
  /// # Errors
  ///
  /// Returns an error for unclosed or empty placeholders, invalid field
  /// references and unknown or malformed filters.
  pub fn parse(source: &str) -> Result<Self, TemplateError> {
    Ok(Self {
      source: source.to_string(),
      segments: parse(source)?,
    })
  }

  /// The `{{slug}}` template.
  pub fn slug() -> Self {
    Self {
      source: CANONICAL_SLUG_SENTINEL.to_string(),
      segments: vec![Segment::Placeholder(Placeholder {
        reference: "slug".to_string(),
        filters: Vec::new(),
      })],
    }
  }

  pub fn as_str(&self) -> &str {
    &self.source
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  /// Iterate over the placeholders in source order.
  pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
    self.segments.iter().filter_map(|s| match s {
      Segment::Placeholder(p) => Some(p),
      Segment::Literal(_) => None,
    })
  }

  pub fn has_placeholders(&self) -> bool {
    self.placeholders().next().is_some()
  }

  /// Whether any placeholder carries the `localize` modifier.
  pub fn has_localized_placeholders(&self) -> bool {
    self.placeholders().any(Placeholder::is_localized)
  }

  /// Whether the template is exactly `{{slug}}`.
  pub fn is_slug_sentinel(&self) -> bool {
    matches!(
      self.segments.as_slice(),
      [Segment::Placeholder(Placeholder { reference, filters })] if reference == "slug" && filters.is_empty()
    )
  }

  /// Number of `/`-separated path segments in the template source.
  pub fn path_depth(&self) -> usize {
    self.source.split('/').filter(|s| !s.is_empty()).count()
  }

  /// Render the template, resolving each placeholder with `resolve`.
  ///
  /// # Errors
  ///
  /// Propagates the first error returned by `resolve`.
  pub fn render<F>(&self, mut resolve: F) -> Result<String, TemplateError>
  where
    F: FnMut(&Placeholder) -> Result<String, TemplateError>,
  {
    let mut result = String::with_capacity(self.source.len());

    for segment in &self.segments {
      match segment {
        Segment::Literal(s) => result.push_str(s),
        Segment::Placeholder(p) => result.push_str(&resolve(p)?),
      }
    }

    Ok(result)
  }
}

impl FromStr for Template {
  type Err = TemplateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl TryFrom<String> for Template {
  type Error = TemplateError;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    Self::parse(&s)
  }
}

impl From<Template> for String {
  fn from(template: Template) -> Self {
    template.source
  }
}

impl fmt::Display for Template {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.source)
  }
}

/// Parse a string containing placeholders into segments.
///
/// A lone `}}` outside a placeholder is literal text.
///
/// # Errors
///
/// Returns an error if a placeholder is malformed.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut rest = input;
  let mut offset = 0;

  while let Some(start) = rest.find("{{") {
    if start > 0 {
      segments.push(Segment::Literal(rest[..start].to_string()));
    }

    let inner = &rest[start + 2..];
    let end = inner.find("}}").ok_or(TemplateError::Unclosed(offset + start))?;
    segments.push(Segment::Placeholder(parse_placeholder(&inner[..end], offset + start)?));

    let consumed = start + 2 + end + 2;
    offset += consumed;
    rest = &rest[consumed..];
  }

  if !rest.is_empty() {
    segments.push(Segment::Literal(rest.to_string()));
  }

  Ok(segments)
}

/// Parse the content inside a placeholder (everything between `{{` and `}}`).
fn parse_placeholder(content: &str, pos: usize) -> Result<Placeholder, TemplateError> {
  let mut parts = split_filters(content).into_iter();

  let reference = parts.next().map(str::trim).unwrap_or_default();
  if reference.is_empty() {
    return Err(TemplateError::Empty(pos));
  }
  if !reference
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
  {
    return Err(TemplateError::InvalidReference(reference.to_string()));
  }

  let filters = parts.map(|p| parse_filter(p.trim())).collect::<Result<Vec<_>, _>>()?;

  Ok(Placeholder {
    reference: reference.to_string(),
    filters,
  })
}

/// Split on `|`, ignoring pipes inside quoted filter arguments.
fn split_filters(content: &str) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut quote: Option<char> = None;
  let mut start = 0;

  for (i, c) in content.char_indices() {
    match (quote, c) {
      (None, '\'' | '"') => quote = Some(c),
      (Some(q), _) if c == q => quote = None,
      (None, '|') => {
        parts.push(&content[start..i]);
        start = i + 1;
      }
      _ => {}
    }
  }
  parts.push(&content[start..]);

  parts
}

fn parse_filter(spec: &str) -> Result<Filter, TemplateError> {
  let malformed = || TemplateError::MalformedFilter(spec.to_string());

  let (name, arg) = match spec.find('(') {
    Some(i) => {
      if !spec.ends_with(')') {
        return Err(malformed());
      }
      (spec[..i].trim(), Some(spec[i + 1..spec.len() - 1].trim()))
    }
    None => (spec, None),
  };

  match (name, arg) {
    ("", _) => Err(malformed()),
    ("localize", None) => Ok(Filter::Localize),
    ("upper", None) => Ok(Filter::Upper),
    ("lower", None) => Ok(Filter::Lower),
    ("trim", None) => Ok(Filter::Trim),
    ("default", Some(arg)) => unquote(arg).map(|s| Filter::Default(s.to_string())).ok_or_else(malformed),
    ("truncate", Some(arg)) => arg.parse().map(Filter::Truncate).map_err(|_| malformed()),
    ("localize" | "upper" | "lower" | "trim", Some(_)) | ("default" | "truncate", None) => Err(malformed()),
    _ => Err(TemplateError::UnknownFilter(name.to_string())),
  }
}

fn unquote(arg: &str) -> Option<&str> {
  ['\'', '"']
    .iter()
    .find_map(|q| arg.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
}
