use std::{any::Any, path::PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

/// Keeps a watcher group alive until dropped.
pub type WatchGuard = Box<dyn Any + Send>;

pub trait FileWatcher: Send + Sync {
  /// Watches `paths` and sends the paths of every change to `events` for as long as
  /// the returned guard lives.
  fn watch(
    &self,
    paths: &[PathBuf],
    events: UnboundedSender<Vec<PathBuf>>,
  ) -> anyhow::Result<WatchGuard>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyWatcher;

impl FileWatcher for NotifyWatcher {
  fn watch(
    &self,
    paths: &[PathBuf],
    events: UnboundedSender<Vec<PathBuf>>,
  ) -> anyhow::Result<WatchGuard> {
    let mut watcher = RecommendedWatcher::new(
      move |res: Result<Event, notify::Error>| {
        let Ok(event) = res else {
          return;
        };
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
          return;
        }
        // The receiver only goes away together with this watcher.
        let _ = events.send(event.paths);
      },
      notify::Config::default(),
    )?;

    for path in paths {
      if let Err(err) = watcher.watch(path, RecursiveMode::NonRecursive) {
        tracing::debug!("Not watching {}: {err}", path.display());
      }
    }
    Ok(Box::new(watcher))
  }
}
