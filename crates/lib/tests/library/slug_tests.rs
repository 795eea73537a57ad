//! Slug variants as seen through a full save.

use std::sync::Mutex;

use folio_lib::assets::DefaultNamer;
use folio_lib::changes::FileAction;
use folio_lib::draft::Draft;
use folio_lib::save::{SaveConfig, prepare_save, prepare_save_with};
use folio_lib::template::{FillContext, StandardFiller, Template, TemplateError, TemplateFiller};
use serde_json::json;

use super::common::{collection, empty_cache, new_draft};

const LOCALIZED: &str = r#"
name: posts
folder: content/posts
slug: "{{title | localize}}"
i18n:
  structure: multiple_files
  locales: [en, ja]
fields:
  - { name: title, i18n: true }
"#;

/// Records every template it fills.
#[derive(Default)]
struct RecordingFiller {
  filled: Mutex<Vec<String>>,
}

impl TemplateFiller for RecordingFiller {
  fn fill(&self, template: &Template, ctx: &FillContext<'_>) -> Result<String, TemplateError> {
    self.filled.lock().unwrap().push(template.as_str().to_string());
    StandardFiller.fill(template, ctx)
  }
}

fn localized_draft() -> Draft {
  let mut draft = new_draft(LOCALIZED);
  draft.set_field_value("en", "title", json!("Hello"));
  draft.set_field_value("ja", "title", json!("Konnichiwa"));
  draft
}

#[tokio::test]
async fn localized_slugs_name_each_locale_file() {
  let output = prepare_save(&localized_draft(), &SaveConfig::default(), empty_cache())
    .await
    .unwrap();

  let localized = output.slugs.localized_slugs.as_ref().unwrap();
  assert_eq!(localized["en"], "hello");
  assert_eq!(localized["ja"], "konnichiwa");

  let paths: Vec<_> = output.changes.iter().map(|c| c.path.as_str()).collect();
  assert_eq!(paths, vec!["content/posts/hello.en.md", "content/posts/konnichiwa.ja.md"]);
  assert_eq!(output.entry.locales["ja"].slug, "konnichiwa");
}

#[tokio::test]
async fn sentinel_canonical_slug_is_the_default_slug_without_filling() {
  let filler = RecordingFiller::default();
  let draft = localized_draft();
  let namer = DefaultNamer::default();

  let output = prepare_save_with(&draft, &SaveConfig::default(), empty_cache(), &filler, &namer)
    .await
    .unwrap();

  assert_eq!(output.slugs.canonical_slug.as_deref(), Some("hello"));
  assert_eq!(output.slugs.canonical_slug.as_deref(), Some(output.slugs.default_locale_slug.as_str()));
  assert!(!filler.filled.lock().unwrap().iter().any(|t| t == "{{slug}}"));
}

#[tokio::test]
async fn canonical_slug_is_written_to_every_locale() {
  let output = prepare_save(&localized_draft(), &SaveConfig::default(), empty_cache())
    .await
    .unwrap();

  for change in &output.changes {
    let text = change.data.as_ref().and_then(|d| d.as_text()).unwrap();
    assert!(text.contains("translationKey: hello"), "{}: {text}", change.path);
  }
}

#[tokio::test]
async fn custom_canonical_template_sees_the_default_slug() {
  let yaml = r#"
name: posts
folder: content/posts
slug: "{{title | localize}}"
i18n:
  structure: multiple_folders
  locales: [en, ja]
  canonical_slug: { key: ref, value: "post-{{slug}}" }
"#;
  let mut draft = new_draft(yaml);
  draft.set_field_value("en", "title", json!("Hello"));
  draft.set_field_value("ja", "title", json!("Konnichiwa"));

  let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

  assert_eq!(output.slugs.canonical_slug.as_deref(), Some("post-hello"));
  assert_eq!(output.entry.locales["ja"].content.as_ref().unwrap()["ref"], json!("post-hello"));
}

#[tokio::test]
async fn no_canonical_slug_without_localized_placeholders() {
  let yaml = "name: posts\nfolder: content/posts\nslug: \"{{title}}\"\ni18n: { structure: multiple_files, locales: [en, ja] }";
  let mut draft = new_draft(yaml);
  draft.set_field_value("en", "title", json!("Hello"));

  let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

  assert!(output.slugs.localized_slugs.is_none());
  assert!(output.slugs.canonical_slug.is_none());
  for change in &output.changes {
    let text = change.data.as_ref().and_then(|d| d.as_text()).unwrap();
    assert!(!text.contains("translationKey"));
  }
}

#[tokio::test]
async fn index_file_uses_fixed_name() {
  let yaml = "name: posts\nfolder: content/posts\npath: \"{{slug}}/index\"\nindex_file: true";
  let mut draft = new_draft(yaml);
  draft.is_index_file = true;
  draft.set_field_value("_default", "title", json!("Section"));

  let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

  assert_eq!(output.slugs.default_locale_slug, "_index");
  assert_eq!(output.changes[0].path, "content/posts/_index.md");
}

#[tokio::test]
async fn file_collection_uses_file_name() {
  let yaml = r#"
name: settings
files:
  - { name: site, file: "data/{{locale}}/site.yml" }
i18n: { structure: multiple_folders, locales: [en, ja] }
"#;
  let mut draft = Draft::new(collection(yaml), Some("site")).unwrap();
  draft.set_field_value("en", "title", json!("My site"));
  draft.set_field_value("ja", "title", json!("Watashi no saito"));

  let output = prepare_save(&draft, &SaveConfig::default(), empty_cache()).await.unwrap();

  assert_eq!(output.slugs.default_locale_slug, "site");
  let paths: Vec<_> = output.changes.iter().map(|c| c.path.as_str()).collect();
  assert_eq!(paths, vec!["data/en/site.yml", "data/ja/site.yml"]);
  assert!(output.changes.iter().all(|c| c.action == FileAction::Create));
  let text = output.changes[0].data.as_ref().and_then(|d| d.as_text()).unwrap();
  assert_eq!(text, "title: My site\n");
}
