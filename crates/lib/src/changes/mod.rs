//! File changes produced by a save.
//!
//! [`build_change_set`] classifies every touched file; [`attach_previous_hashes`]
//! then annotates the changes that replace or remove an existing file with
//! its last known hash.

mod build;
mod types;

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::sha_cache::ShaCache;

pub use build::{ChangeSet, ChangeSetInput, build_change_set};
pub use types::{Entry, FileAction, FileChange, FileData, LocalizedEntry};

/// Look up the previous hash of every guarded change concurrently.
///
/// Misses leave `previous_hash` unset.
pub async fn attach_previous_hashes<C>(changes: &mut [FileChange], cache: Arc<C>)
where
  C: ShaCache + 'static,
{
  let mut join_set = JoinSet::new();

  for (index, change) in changes.iter().enumerate() {
    let Some(path) = change.guarded_path().map(str::to_string) else {
      continue;
    };
    let cache = Arc::clone(&cache);
    join_set.spawn(async move {
      let hash = cache.previous_hash(&path).await;
      (index, path, hash)
    });
  }

  while let Some(join_result) = join_set.join_next().await {
    match join_result {
      Ok((index, path, hash)) => {
        debug!(path = %path, known = hash.is_some(), "previous hash lookup");
        changes[index].previous_hash = hash;
      }
      Err(e) => {
        warn!(error = %e, "previous hash lookup task failed, treating as miss");
      }
    }
  }
}
