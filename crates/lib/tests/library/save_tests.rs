//! End-to-end save preparation across the i18n structures.

use folio_lib::changes::FileAction;
use folio_lib::collection::CollectionError;
use folio_lib::draft::Draft;
use folio_lib::save::{SaveConfig, SaveError, prepare_save};
use folio_lib::sha_cache::MemoryShaCache;
use serde_json::json;
use std::sync::Arc;

use super::common::{collection, empty_cache, new_draft, saved_entry, with_action};

const PLAIN: &str = "name: posts\nfolder: content/posts\nslug: \"{{title}}\"";

fn localized_collection(structure: &str) -> String {
  format!(
    "name: posts\nfolder: content/posts\nslug: \"{{{{title}}}}\"\ni18n: {{ structure: {structure}, locales: [en, ja, fr] }}\nfields:\n  - {{ name: title, i18n: true }}\n"
  )
}

mod i18n_disabled {
  use super::*;

  #[tokio::test]
  async fn new_entry_is_one_create() {
    let mut draft = new_draft(PLAIN);
    draft.set_field_value("_default", "title", json!("Hello World"));

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].action, FileAction::Create);
    assert_eq!(output.changes[0].path, "content/posts/hello-world.md");
    assert!(output.slugs.localized_slugs.is_none());
    assert!(output.slugs.canonical_slug.is_none());
  }

  #[tokio::test]
  async fn existing_entry_is_one_update() {
    let entry = saved_entry("foo", &["_default"], |_| "content/posts/foo.md".to_string());
    let mut draft = Draft::from_entry(collection(PLAIN), None, entry).unwrap();
    draft.set_field_value("_default", "title", json!("Changed title"));

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].action, FileAction::Update);
    assert_eq!(output.changes[0].path, "content/posts/foo.md");
    assert_eq!(output.entry.id, "entry-1");
  }

  #[tokio::test]
  async fn renamed_entry_is_one_move() {
    let entry = saved_entry("foo", &["_default"], |_| "content/posts/foo.md".to_string());
    let mut draft = Draft::from_entry(collection(PLAIN), None, entry).unwrap();
    draft.current_slugs.insert("_default".to_string(), "bar".to_string());

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].action, FileAction::Move);
    assert_eq!(output.changes[0].path, "content/posts/bar.md");
    assert_eq!(output.changes[0].previous_path.as_deref(), Some("content/posts/foo.md"));
  }
}

mod per_locale {
  use super::*;

  #[tokio::test]
  async fn new_entry_with_one_enabled_locale_creates_one_file() {
    let yaml = "name: posts\nfolder: content/posts\nslug: \"{{title}}\"\ni18n: { structure: multiple_folders, locales: [en, ja] }";
    let mut draft = new_draft(yaml);
    draft.set_locale_enabled("ja", false);
    draft.set_field_value("en", "title", json!("Hello"));

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].action, FileAction::Create);
    assert!(output.changes[0].path.ends_with("en/hello.md"));
    assert_eq!(output.changes[0].path, "content/posts/en/hello.md");
    assert_eq!(output.entry.locales.keys().collect::<Vec<_>>(), vec!["en"]);
  }

  #[tokio::test]
  async fn rename_and_disable_gives_move_and_delete() {
    let yaml = "name: posts\nfolder: content/posts\ni18n: { structure: multiple_files, locales: [en, ja] }";
    let entry = saved_entry("foo", &["en", "ja"], |l| format!("content/posts/foo.{l}.md"));
    let mut draft = Draft::from_entry(collection(yaml), None, entry).unwrap();
    draft.set_locale_enabled("ja", false);
    draft.current_slugs.insert("en".to_string(), "bar".to_string());

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes.len(), 2);
    let moved = with_action(&output.changes, FileAction::Move);
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].path, "content/posts/bar.en.md");
    assert_eq!(moved[0].previous_path.as_deref(), Some("content/posts/foo.en.md"));

    let deleted = with_action(&output.changes, FileAction::Delete);
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].path, "content/posts/foo.ja.md");
    assert!(deleted[0].data.is_none());
    assert!(deleted[0].previous_path.is_none());
  }

  #[tokio::test]
  async fn deletes_match_removed_locales_for_every_structure() {
    for structure in ["multiple_files", "multiple_folders", "multiple_folders_at_root"] {
      let collection = collection(&localized_collection(structure));
      let entry = saved_entry("foo", &["en", "ja", "fr"], |l| match structure {
        "multiple_files" => format!("content/posts/foo.{l}.md"),
        "multiple_folders" => format!("content/posts/{l}/foo.md"),
        _ => format!("{l}/content/posts/foo.md"),
      });
      let mut draft = Draft::from_entry(collection, None, entry).unwrap();
      draft.set_locale_enabled("ja", false);
      draft.set_locale_enabled("fr", false);

      let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

      assert_eq!(with_action(&output.changes, FileAction::Delete).len(), 2, "{structure}");
      assert_eq!(with_action(&output.changes, FileAction::Update).len(), 1, "{structure}");
    }
  }

  #[tokio::test]
  async fn locale_added_to_existing_entry_is_created() {
    let collection = collection(&localized_collection("multiple_folders"));
    let entry = saved_entry("foo", &["en"], |l| format!("content/posts/{l}/foo.md"));
    let mut draft = Draft::from_entry(collection, None, entry).unwrap();
    draft.set_locale_enabled("fr", true);
    draft.set_field_value("fr", "title", json!("Bonjour"));

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    let created = with_action(&output.changes, FileAction::Create);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].path, "content/posts/fr/foo.md");
    assert_eq!(with_action(&output.changes, FileAction::Update).len(), 1);
    assert!(with_action(&output.changes, FileAction::Delete).is_empty());
  }

  #[tokio::test]
  async fn never_enabled_locale_emits_nothing() {
    let mut draft = new_draft(&localized_collection("multiple_files"));
    draft.set_locale_enabled("fr", false);
    draft.set_field_value("en", "title", json!("Hello"));
    draft.set_field_value("ja", "title", json!("Hello"));

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    let paths: Vec<_> = output.changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["content/posts/hello.en.md", "content/posts/hello.ja.md"]);
  }
}

mod single_file {
  use super::*;

  #[tokio::test]
  async fn every_locale_lands_in_one_file() {
    let yaml = "name: posts\nfolder: content/posts\nslug: \"{{title}}\"\ni18n: { structure: single_file, locales: [en, ja] }\nfields:\n  - { name: title, i18n: true }";
    let mut draft = new_draft(yaml);
    draft.set_field_value("en", "title", json!("Hello"));
    draft.set_field_value("ja", "title", json!("Konnichiwa"));

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes.len(), 1);
    assert_eq!(output.changes[0].path, "content/posts/hello.md");
    let text = output.changes[0].data.as_ref().and_then(|d| d.as_text()).unwrap();
    assert!(text.contains("en:"), "{text}");
    assert!(text.contains("ja:"), "{text}");
    assert!(text.contains("Konnichiwa"), "{text}");
    assert_eq!(output.entry.locales.len(), 2);
  }
}

mod previous_hashes {
  use super::*;

  #[tokio::test]
  async fn guarded_changes_carry_cached_hashes() {
    let yaml = "name: posts\nfolder: content/posts\ni18n: { structure: multiple_files, locales: [en, ja, fr] }";
    let entry = saved_entry("foo", &["en", "ja", "fr"], |l| format!("content/posts/foo.{l}.md"));
    let mut draft = Draft::from_entry(collection(yaml), None, entry).unwrap();
    draft.set_locale_enabled("fr", false);
    draft.current_slugs.insert("en".to_string(), "bar".to_string());

    let cache = Arc::new(MemoryShaCache::with_entries([
      ("content/posts/foo.en.md".to_string(), "h-en".to_string()),
      ("content/posts/foo.ja.md".to_string(), "h-ja".to_string()),
      ("content/posts/foo.fr.md".to_string(), "h-fr".to_string()),
    ]));

    let output = prepare_save(&draft, &SaveConfig::default(), cache).await.unwrap();

    let hash_of = |path: &str| {
      output
        .changes
        .iter()
        .find(|c| c.path == path)
        .and_then(|c| c.previous_hash.clone())
    };
    assert_eq!(with_action(&output.changes, FileAction::Move).len(), 2);
    assert_eq!(hash_of("content/posts/bar.en.md").as_deref(), Some("h-en"));
    assert_eq!(hash_of("content/posts/bar.ja.md").as_deref(), Some("h-ja"));
    assert_eq!(hash_of("content/posts/foo.fr.md").as_deref(), Some("h-fr"));
  }

  #[tokio::test]
  async fn update_is_guarded_by_its_own_path() {
    let entry = saved_entry("foo", &["_default"], |_| "content/posts/foo.md".to_string());
    let draft = Draft::from_entry(collection(PLAIN), None, entry).unwrap();
    let cache = Arc::new(MemoryShaCache::with_entries([(
      "content/posts/foo.md".to_string(),
      "abc123".to_string(),
    )]));

    let output = prepare_save(&draft, &SaveConfig::default(), cache).await.unwrap();

    assert_eq!(output.changes[0].action, FileAction::Update);
    assert_eq!(output.changes[0].previous_hash.as_deref(), Some("abc123"));
  }

  #[tokio::test]
  async fn cache_miss_leaves_hash_unset() {
    let entry = saved_entry("foo", &["_default"], |_| "content/posts/foo.md".to_string());
    let draft = Draft::from_entry(collection(PLAIN), None, entry).unwrap();

    let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

    assert_eq!(output.changes[0].action, FileAction::Update);
    assert!(output.changes[0].previous_hash.is_none());
  }

  #[tokio::test]
  async fn creates_are_never_guarded() {
    let mut draft = new_draft(PLAIN);
    draft.set_field_value("_default", "title", json!("Hello"));
    let cache = Arc::new(MemoryShaCache::with_entries([(
      "content/posts/hello.md".to_string(),
      "stale".to_string(),
    )]));

    let output = prepare_save(&draft, &SaveConfig::default(), cache).await.unwrap();
    assert!(output.changes[0].previous_hash.is_none());
  }
}

mod failures {
  use super::*;

  #[tokio::test]
  async fn missing_slug_field_fails_the_whole_save() {
    let mut draft = new_draft(&localized_collection("multiple_files"));
    draft.set_field_value("ja", "title", json!("only ja"));

    let result = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await;
    assert!(matches!(result, Err(SaveError::Template(_))));
  }

  #[tokio::test]
  async fn unknown_structure_is_fatal() {
    let yaml = "name: posts\nfolder: content/posts\ni18n: { structure: multiple_branches, locales: [en] }";
    let collection = collection(yaml);
    assert!(matches!(
      Draft::new(Arc::clone(&collection), None),
      Err(CollectionError::UnknownStructure(ref s)) if s == "multiple_branches"
    ));
  }
}
