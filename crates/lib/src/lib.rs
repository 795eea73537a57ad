//! folio-lib: the entry-save engine for Folio
//!
//! This crate turns an in-memory, multi-locale content draft into the set of
//! file operations that a Git-backed repository backend commits atomically:
//! - `Template`: placeholder templates for slugs, paths and commit messages
//! - `Collection`: collection metadata, i18n layout and entry file paths
//! - `Draft`: the editing session state being saved
//! - `EntrySlugVariants`: default, per-locale and canonical slugs
//! - `FileChange`: one create/update/move/delete operation on a file
//! - `ShaCache`: last-known content hashes for conflict-aware writes

pub mod assets;
pub mod changes;
pub mod collection;
pub mod consts;
pub mod content;
pub mod draft;
pub mod format;
pub mod save;
pub mod sha_cache;
pub mod slug;
pub mod template;
pub mod types;
