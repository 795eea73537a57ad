use std::collections::BTreeMap;

use serde_json::Value;

/// A locale code such as `en` or `pt-BR`, or [`crate::consts::DEFAULT_LOCALE_KEY`].
pub type Locale = String;

/// Field values of one locale, keyed by dot-delimited key paths
/// (`authors.0.name`). A `null` value stands for an unset field.
pub type FlatContent = BTreeMap<String, Value>;

/// A per-locale map.
pub type LocaleMap<T> = BTreeMap<Locale, T>;

/// Render a scalar content value as text.
///
/// Returns `None` for `null`, arrays and objects, which have no single
/// textual form usable in a slug or path.
pub fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}
