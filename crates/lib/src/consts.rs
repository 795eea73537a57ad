/// Locale key used for content when i18n is disabled for a collection.
pub const DEFAULT_LOCALE_KEY: &str = "_default";

/// Untagged slot in slug maps, used before slugs become per-locale.
pub const FALLBACK_SLUG_KEY: &str = "_";

/// Field whose value feeds `{{slug}}` when no slug is bound yet.
pub const DEFAULT_IDENTIFIER_FIELD: &str = "title";

/// Canonical slug template meaning "same as the default-locale slug". Also
/// the slug template of collections that configure none.
pub const CANONICAL_SLUG_SENTINEL: &str = "{{slug}}";

/// Content key holding the canonical slug unless configured otherwise.
pub const DEFAULT_CANONICAL_SLUG_KEY: &str = "translationKey";

/// File name (without extension) of a collection index file.
pub const DEFAULT_INDEX_FILE_NAME: &str = "_index";

/// Extension used when neither `extension` nor `format` is configured.
pub const DEFAULT_EXTENSION: &str = "md";

/// Key under which front matter formats store the document body.
pub const BODY_FIELD: &str = "body";

/// Key selecting the variant of a variable-type list item.
pub const DEFAULT_TYPE_KEY: &str = "type";

/// Length of the content hash suffix appended to hashed upload names.
pub const UPLOAD_HASH_LEN: usize = 8;

/// Version of the on-disk SHA cache index format.
pub const SHA_CACHE_VERSION: u32 = 1;
