//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// A folio command for `subcommand` against the posts collection and a draft fixture.
pub fn folio(subcommand: &str, draft: &str) -> Command {
  let mut cmd = cargo_bin_cmd!("folio");
  cmd
    .env_remove("RUST_LOG")
    .arg(subcommand)
    .arg("--collection")
    .arg(fixture_path("posts.yml"))
    .arg("--draft")
    .arg(fixture_path(draft));
  cmd
}

/// Run a command expecting success and parse its stdout as JSON.
pub fn json_output(cmd: &mut Command) -> serde_json::Value {
  let output = cmd.arg("--output").arg("json").assert().success().get_output().stdout.clone();
  serde_json::from_slice(&output).unwrap_or_else(|e| panic!("stdout is not JSON: {}", e))
}

/// Isolated test environment with its own temporary directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Copy a fixture into the temp directory and return its path.
  pub fn copy_fixture(&self, name: &str) -> PathBuf {
    let path = self.temp.path().join(name);
    std::fs::write(&path, fixture_content(name)).unwrap();
    path
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }
}
