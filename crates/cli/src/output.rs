//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored change
//! lines, status messages and human-readable sizes.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use folio_lib::changes::{FileAction, FileChange};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const PLUS: &str = "+";
  pub const MINUS: &str = "-";
  pub const TILDE: &str = "~";
}

pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

pub fn format_bytes(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;
  const GB: u64 = MB * 1024;

  if bytes >= GB {
    format!("{:.1} GB", bytes as f64 / GB as f64)
  } else if bytes >= MB {
    format!("{:.1} MB", bytes as f64 / MB as f64)
  } else if bytes >= KB {
    format!("{:.1} KB", bytes as f64 / KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// Symbol of a change, uncolored.
pub fn action_symbol(action: FileAction) -> &'static str {
  match action {
    FileAction::Create => symbols::PLUS,
    FileAction::Update => symbols::TILDE,
    FileAction::Move => symbols::ARROW,
    FileAction::Delete => symbols::MINUS,
  }
}

/// Print one planned change. With `verbose`, the guarding hash is shown too.
pub fn print_change(change: &FileChange, verbose: bool) {
  let symbol = action_symbol(change.action);
  let colored = match change.action {
    FileAction::Create => symbol.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    FileAction::Update => symbol.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
    FileAction::Move => symbol.if_supports_color(Stream::Stdout, |s| s.cyan()).to_string(),
    FileAction::Delete => symbol.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
  };

  let mut line = format!("  {} {}", colored, change.path);
  if let Some(previous) = &change.previous_path {
    line.push_str(&format!(" (from {})", previous));
  }
  if verbose {
    if let Some(hash) = &change.previous_hash {
      let note = format!("[{}]", truncate_hash(hash));
      line.push_str(&format!(" {}", note.if_supports_color(Stream::Stdout, |s| s.dimmed())));
    }
  }
  println!("{}", line);
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
