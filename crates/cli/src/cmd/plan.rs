//! Implementation of the `folio plan` command.
//!
//! Runs the save pipeline on a draft and prints the file changes and uploads
//! a commit would contain. Nothing is written to the repository.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use folio_lib::save::{SaveConfig, SaveOutput, commit_message, prepare_save};
use folio_lib::sha_cache::{FileShaCache, MemoryShaCache};

use super::{load_document, load_draft};
use crate::output::{OutputFormat, format_bytes, print_change, print_info, print_json, print_stat, print_success};

pub fn cmd_plan(
  collection: &Path,
  draft: &Path,
  cache: Option<&Path>,
  config: Option<&Path>,
  verbose: bool,
  output: OutputFormat,
) -> Result<()> {
  let draft = load_draft(collection, draft)?;
  let config: SaveConfig = match config {
    Some(path) => load_document(path)?,
    None => SaveConfig::default(),
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let planned = match cache {
    Some(path) => rt.block_on(prepare_save(&draft, &config, Arc::new(FileShaCache::new(path)))),
    None => rt.block_on(prepare_save(&draft, &config, Arc::new(MemoryShaCache::new()))),
  }
  .context("Failed to prepare save")?;

  let message = commit_message(&draft, &planned, &config).context("Failed to render commit message")?;

  if output.is_json() {
    print_json(&serde_json::json!({
      "message": message,
      "entry": planned.entry,
      "slugs": planned.slugs,
      "changes": planned.commit_changes(),
      "assets": planned.assets,
    }))?;
  } else {
    print_human_plan(&planned, &message, verbose);
  }

  Ok(())
}

fn print_human_plan(planned: &SaveOutput, message: &str, verbose: bool) {
  print_success(&format!("Plan: {} ({})", planned.entry.slug, planned.entry.id));
  print_stat("Message", message);
  print_stat("Locales", &planned.entry.locales.keys().cloned().collect::<Vec<_>>().join(", "));

  println!();
  println!("Changes:");
  for change in &planned.changes {
    print_change(change, verbose);
  }

  if !planned.assets.is_empty() {
    println!();
    println!("Uploads:");
    for asset in &planned.assets {
      println!("  + {} ({})", asset.path, format_bytes(asset.size as u64));
      if verbose {
        print_stat("url", &asset.public_url);
      }
    }
  }

  if planned.changes.is_empty() && planned.assets.is_empty() {
    println!();
    print_info("Nothing to commit");
  }
}
