use std::path::{Path, PathBuf};

use amppack_ecmascript::{PropertyCache, VariableCache};
use dashmap::DashSet;
use tokio::sync::Mutex;

use crate::engine::RebuildHandle;

/// Renames shared by the minifications of one process. Properties keep their
/// mangled names across bundles; `vars` only holds the renames of the latest
/// call and is locked just to publish them.
#[derive(Debug, Default)]
pub struct NameCache {
  pub props: PropertyCache,
  pub vars: Mutex<VariableCache>,
}

/// Process-scoped build state. Pipelines sharing one see each other's property
/// names and watch registrations.
#[derive(Debug, Default)]
pub struct BuildState {
  pub name_cache: NameCache,
  watched: DashSet<PathBuf>,
}

impl BuildState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_watched(&self, entry_point: &Path) -> bool {
    self.watched.contains(entry_point)
  }

  /// Returns `false` when `entry_point` was already being watched.
  pub(crate) fn start_watching(&self, entry_point: PathBuf) -> bool {
    self.watched.insert(entry_point)
  }

  pub(crate) fn stop_watching(&self, entry_point: &Path) {
    self.watched.remove(entry_point);
  }

  pub fn watched_len(&self) -> usize {
    self.watched.len()
  }
}

/// Bundler state of one entry point.
#[derive(Default)]
pub enum EntryBuildState {
  #[default]
  NotBuilt,
  Built(Box<dyn RebuildHandle>),
}
