//! Tests for `folio slug`.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;

use super::common::{TestEnv, fixture_path, folio, json_output};

#[test]
fn localized_and_canonical_slugs() {
  let out = json_output(&mut folio("slug", "new_post.json"));

  assert_eq!(out["defaultLocaleSlug"], json!("hello-world"));
  assert_eq!(out["localizedSlugs"], json!({ "en": "hello-world", "ja": "konnichiwa" }));
  assert_eq!(out["canonicalSlug"], json!("hello-world"));
}

#[test]
fn existing_entry_keeps_its_current_slug() {
  let out = json_output(&mut folio("slug", "edit_post.json"));
  assert_eq!(out["defaultLocaleSlug"], json!("bar"));
}

#[test]
fn text_output_lists_locales() {
  folio("slug", "new_post.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Slug: hello-world"))
    .stdout(predicate::str::contains("ja: konnichiwa"))
    .stdout(predicate::str::contains("canonical: hello-world"));
}

#[test]
fn shared_slug_warns_about_missing_canonical() {
  let env = TestEnv::new();
  let collection = env.write_file(
    "pages.yml",
    "name: posts\nfolder: content/pages\ni18n: { structure: multiple_folders, locales: [en, ja] }\n",
  );

  cargo_bin_cmd!("folio")
    .env_remove("RUST_LOG")
    .arg("slug")
    .arg("--collection")
    .arg(&collection)
    .arg("--draft")
    .arg(fixture_path("new_post.json"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Slug: hello-world"))
    .stderr(predicate::str::contains("No canonical slug"));
}
