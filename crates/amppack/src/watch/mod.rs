mod debounce;
mod watcher;

use std::sync::Arc;

use amppack_common::BundleOptions;
use amppack_error::PipelineError;
use amppack_utils::path_ext::PathExt;
use tokio::{sync::mpsc, task::JoinHandle};

pub use self::watcher::{FileWatcher, NotifyWatcher, WatchGuard};
use self::debounce::{spawn_debounced, DebouncedReceiver};
use crate::{
  engine::DependencyScan,
  pipeline::{CompileJob, Pipeline, PipelineInner},
  stages::bundle::plugin_chain,
};

/// The watcher group and rebuild task of one entry point.
pub(crate) struct WatchSession {
  _guard: WatchGuard,
  task: JoinHandle<()>,
}

impl Drop for WatchSession {
  fn drop(&mut self) {
    self.task.abort();
  }
}

/// Watches every file `job`'s entry point depends on and recompiles it after each
/// burst of changes. Failed recompiles are logged and never end the session.
pub(crate) async fn enter_watch_mode(
  inner: &Arc<PipelineInner>,
  job: &CompileJob,
) -> anyhow::Result<()> {
  let entry_point = job.entry_point();
  let scan =
    DependencyScan { entry_point: entry_point.clone(), plugins: plugin_chain(inner, &job.options) };
  let dependencies = inner.collaborators.engine.dependencies(scan).await.map_err(|err| {
    PipelineError::DependencyDiscoveryFailed {
      entry_point: entry_point.clone(),
      message: format!("{err:#}"),
    }
  })?;
  tracing::debug!("Watching {} files for {}", dependencies.len(), entry_point.display());

  let (sender, receiver) = mpsc::unbounded_channel();
  let guard = inner.collaborators.watcher.watch(&dependencies, sender)?;

  let job = CompileJob {
    options: BundleOptions { continue_on_error: true, ..job.options.clone() },
    ..job.clone()
  };
  let pipeline = Arc::downgrade(inner);
  let receiver = DebouncedReceiver::new(receiver, inner.options.watch_debounce);
  let task = spawn_debounced(receiver, move |changed| {
    let pipeline = pipeline.upgrade().map(|inner| Pipeline { inner });
    let job = job.clone();
    async move {
      let Some(pipeline) = pipeline else {
        return false;
      };
      for path in &changed {
        tracing::debug!("Changed {}", path.file_name_lossy());
      }
      if let Err(err) = pipeline.do_compile_js(&job).await {
        tracing::error!("{err}");
      }
      true
    }
  });

  inner.add_watch_session(WatchSession { _guard: guard, task });
  Ok(())
}
