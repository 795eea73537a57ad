//! Slug sanitization for values inserted into slugs and paths.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Character set allowed in generated slugs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugEncoding {
  /// Any Unicode letter or digit is kept.
  #[default]
  Unicode,
  /// Only ASCII letters and digits are kept.
  Ascii,
}

/// Slug generation options, configured per collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlugOptions {
  pub encoding: SlugEncoding,
  /// Strip diacritics (`é` -> `e`) before filtering characters.
  pub clean_accents: bool,
  /// Replacement for every run of disallowed characters.
  pub sanitize_replacement: String,
  pub lowercase: bool,
  /// Remove leading and trailing replacement characters.
  pub trim: bool,
}

impl Default for SlugOptions {
  fn default() -> Self {
    Self {
      encoding: SlugEncoding::Unicode,
      clean_accents: false,
      sanitize_replacement: "-".to_string(),
      lowercase: true,
      trim: true,
    }
  }
}

/// Turn arbitrary text into a slug fragment.
pub fn slugify(input: &str, options: &SlugOptions) -> String {
  let cleaned: String = if options.clean_accents {
    input.nfkd().filter(|c| !is_combining_mark(*c)).collect()
  } else {
    input.to_string()
  };

  let replacement = options.sanitize_replacement.as_str();
  let mut slug = String::with_capacity(cleaned.len());
  let mut pending_replacement = false;

  for c in cleaned.chars() {
    let allowed = match options.encoding {
      SlugEncoding::Unicode => c.is_alphanumeric(),
      SlugEncoding::Ascii => c.is_ascii_alphanumeric(),
    } || matches!(c, '_' | '.' | '~')
      || (c == '-' && replacement != "-");

    if allowed {
      if pending_replacement {
        slug.push_str(replacement);
        pending_replacement = false;
      }
      slug.push(c);
    } else if !slug.is_empty() || !options.trim {
      pending_replacement = true;
    }
  }

  if pending_replacement && !options.trim {
    slug.push_str(replacement);
  }

  if options.lowercase {
    slug = slug.to_lowercase();
  }

  slug
}
