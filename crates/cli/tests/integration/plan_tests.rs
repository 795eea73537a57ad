//! Tests for `folio plan`.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;

use super::common::{TestEnv, fixture_path, folio, json_output};

mod new_entry {
  use super::*;

  #[test]
  fn lists_entry_files_and_uploads() {
    folio("plan", "new_post.json")
      .assert()
      .success()
      .stdout(predicate::str::contains("Create posts “hello-world”"))
      .stdout(predicate::str::contains("+ content/posts/hello-world.en.md"))
      .stdout(predicate::str::contains("+ content/posts/konnichiwa.ja.md"))
      .stdout(predicate::str::contains("+ static/images/cover.jpg (3 B)"));
  }

  #[test]
  fn json_output_mirrors_the_change_list() {
    let out = json_output(&mut folio("plan", "new_post.json"));

    assert_eq!(out["message"], json!("Create posts “hello-world”"));
    let changes = out["changes"].as_array().unwrap();
    assert_eq!(changes.len(), 3);
    assert!(changes.iter().all(|c| c["action"] == json!("create")));
    assert!(changes.iter().all(|c| c.get("previousPath").is_none()));
    assert_eq!(changes[2]["path"], json!("static/images/cover.jpg"));

    let en = &out["entry"]["locales"]["en"]["content"];
    assert_eq!(en["image"], json!("/images/cover.jpg"));
    assert_eq!(en["body"], json!("First post."));
    assert_eq!(en["translationKey"], json!("hello-world"));
    assert_eq!(out["entry"]["subPath"], json!("hello-world"));
  }

  #[test]
  fn entry_file_carries_front_matter_and_body() {
    let out = json_output(&mut folio("plan", "new_post.json"));
    let text = out["changes"][1]["data"].as_str().unwrap();

    assert!(text.starts_with("---\n"), "{text}");
    assert!(text.contains("title: Konnichiwa"), "{text}");
    assert!(text.contains("translationKey: hello-world"), "{text}");
    assert!(text.ends_with("---\nSaisho no toukou.\n"), "{text}");
  }
}

mod existing_entry {
  use super::*;

  #[test]
  fn rename_and_disabled_locale() {
    folio("plan", "edit_post.json")
      .assert()
      .success()
      .stdout(predicate::str::contains("Update posts “bar”"))
      .stdout(predicate::str::contains(
        "→ content/posts/bar.en.md (from content/posts/foo.en.md)",
      ))
      .stdout(predicate::str::contains("- content/posts/foo.ja.md"));
  }

  #[test]
  fn entry_id_is_kept() {
    let out = json_output(&mut folio("plan", "edit_post.json"));
    assert_eq!(out["entry"]["id"], json!("3f0c9a52-6d7e-4a51-9d3c-0c2b1f5e8a11"));
    assert_eq!(out["changes"][1]["action"], json!("delete"));
    assert!(out["changes"][1].get("data").is_none());
  }

  #[test]
  fn cache_supplies_previous_hashes() {
    let env = TestEnv::new();
    let cache = env.copy_fixture("sha_cache.json");

    let out = json_output(folio("plan", "edit_post.json").arg("--cache").arg(&cache));

    assert_eq!(out["changes"][0]["previousHash"], json!("9b2c4e1d7a3f5b6c8d0e"));
    assert_eq!(out["changes"][1]["previousHash"], json!("1a2b3c4d5e6f7a8b9c0d"));
  }

  #[test]
  fn verbose_shows_short_hashes() {
    let env = TestEnv::new();
    let cache = env.copy_fixture("sha_cache.json");

    folio("plan", "edit_post.json")
      .arg("--cache")
      .arg(&cache)
      .arg("--verbose")
      .assert()
      .success()
      .stdout(predicate::str::contains("[9b2c4e1d7a3f]"));
  }

  #[test]
  fn missing_cache_file_is_empty() {
    let env = TestEnv::new();
    let out = json_output(
      folio("plan", "edit_post.json")
        .arg("--cache")
        .arg(env.temp.path().join("none.json")),
    );
    assert!(out["changes"][0].get("previousHash").is_none());
  }
}

mod settings {
  use super::*;

  #[test]
  fn custom_commit_messages() {
    let out = json_output(
      folio("plan", "new_post.json")
        .arg("--config")
        .arg(fixture_path("save.yml")),
    );
    assert_eq!(out["message"], json!("New posts: hello-world (en, ja) [skip ci]"));
  }

  #[test]
  fn hashed_upload_names() {
    let env = TestEnv::new();
    let config = env.write_file("save.json", r#"{ "hash_upload_names": true }"#);

    folio("plan", "new_post.json")
      .arg("--config")
      .arg(&config)
      .assert()
      .success()
      .stdout(predicate::str::contains("static/images/cover-039058c6.jpg"));
  }
}

mod failures {
  use super::*;

  #[test]
  fn missing_slug_field_fails() {
    folio("plan", "untitled_post.json")
      .assert()
      .failure()
      .stderr(predicate::str::contains("Failed to prepare save"));
  }

  #[test]
  fn draft_of_another_collection_fails() {
    folio("plan", "other_collection.json")
      .assert()
      .failure()
      .stderr(predicate::str::contains("Draft belongs to collection 'pages'"));
  }

  #[test]
  fn malformed_collection_fails() {
    let env = TestEnv::new();
    let collection = env.write_file("broken.yml", "name: posts\nslug: \"{{title\"\n");

    cargo_folio()
      .arg("plan")
      .arg("--collection")
      .arg(&collection)
      .arg("--draft")
      .arg(fixture_path("new_post.json"))
      .assert()
      .failure()
      .stderr(predicate::str::contains("Failed to parse YAML"));
  }

  #[test]
  fn unresolved_upload_is_a_warning() {
    let env = TestEnv::new();
    let draft = env.write_file(
      "draft.json",
      r#"{
        "isNew": true,
        "collectionName": "posts",
        "currentLocales": { "en": true, "ja": false },
        "currentValues": { "en": { "title": "Lost", "body": "![x](blob:local/missing)" } }
      }"#,
    );

    cargo_folio()
      .arg("plan")
      .arg("--collection")
      .arg(fixture_path("posts.yml"))
      .arg("--draft")
      .arg(&draft)
      .assert()
      .success()
      .stdout(predicate::str::contains("+ content/posts/lost.en.md"))
      .stderr(predicate::str::contains("unresolved upload reference"));
  }

  fn cargo_folio() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("folio");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
