use std::{
  path::{Path, PathBuf},
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
  },
};

use amppack_common::{BuildTarget, PipelineOptions, TargetOptions, TargetRegistry};
use async_trait::async_trait;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
  engine::{
    BundlerEngine, DependencyScan, EngineBuildOptions, EngineBuildResult, OutputFile,
    RebuildHandle,
  },
  stages::legacy::{LegacyOptimizer, LegacyRequest},
  utils::output::map_path_of,
  watch::{FileWatcher, WatchGuard},
  Collaborators, NoPrelude, OxcCompressor, Pipeline,
};

pub const DEFAULT_BODY: &str = "window.answer_AMP_PRIVATE_ = 42;\n";

#[derive(Default)]
pub struct EngineCalls {
  pub builds: AtomicUsize,
  pub rebuilds: AtomicUsize,
  pub scans: AtomicUsize,
  pub fail_builds: AtomicBool,
  pub fail_scans: AtomicBool,
  pub last_defines: Mutex<IndexMap<String, String>>,
}

/// Bundles by wrapping a canned body in the requested banner and footer.
#[derive(Default)]
pub struct FakeEngine {
  pub calls: Arc<EngineCalls>,
  bodies: FxHashMap<String, String>,
}

impl FakeEngine {
  pub fn with_body(mut self, src_filename: &str, body: &str) -> Self {
    self.bodies.insert(src_filename.to_string(), body.to_string());
    self
  }

  fn body_of(&self, entry_point: &Path) -> String {
    entry_point
      .file_name()
      .and_then(|name| self.bodies.get(name.to_string_lossy().as_ref()))
      .map_or_else(|| DEFAULT_BODY.to_string(), Clone::clone)
  }
}

struct FakeRebuild {
  calls: Arc<EngineCalls>,
  options: EngineBuildOptions,
  body: String,
}

fn output_files(options: &EngineBuildOptions, body: &str) -> Vec<OutputFile> {
  let src = options.entry_point.file_name().unwrap().to_string_lossy().into_owned();
  let map = serde_json::json!({
    "version": 3,
    "sources": [format!("../src/{src}")],
    "sourcesContent": [body],
    "names": [],
    "mappings": "AAAA",
  });
  vec![
    OutputFile {
      path: options.outfile.clone(),
      text: format!("{}{body}{}", options.banner, options.footer),
    },
    OutputFile { path: map_path_of(&options.outfile), text: map.to_string() },
  ]
}

#[async_trait]
impl RebuildHandle for FakeRebuild {
  async fn rebuild(&mut self) -> anyhow::Result<Vec<OutputFile>> {
    self.calls.rebuilds.fetch_add(1, Ordering::SeqCst);
    if self.calls.fail_builds.load(Ordering::SeqCst) {
      anyhow::bail!("Rebuild failed\n    at rebuild (node_modules/esbuild/lib/main.js:1:1)");
    }
    Ok(output_files(&self.options, &self.body))
  }
}

#[async_trait]
impl BundlerEngine for FakeEngine {
  async fn build(&self, options: EngineBuildOptions) -> anyhow::Result<EngineBuildResult> {
    self.calls.builds.fetch_add(1, Ordering::SeqCst);
    if self.calls.fail_builds.load(Ordering::SeqCst) {
      anyhow::bail!("Build failed\n    at build (node_modules/esbuild/lib/main.js:1:1)");
    }
    self.calls.last_defines.lock().unwrap().clone_from(&options.defines);
    let body = self.body_of(&options.entry_point);
    let output_files = output_files(&options, &body);
    let rebuild = FakeRebuild { calls: Arc::clone(&self.calls), options, body };
    Ok(EngineBuildResult { output_files, rebuild: Some(Box::new(rebuild)) })
  }

  async fn dependencies(&self, scan: DependencyScan) -> anyhow::Result<Vec<PathBuf>> {
    self.calls.scans.fetch_add(1, Ordering::SeqCst);
    if self.calls.fail_scans.load(Ordering::SeqCst) {
      anyhow::bail!("Could not resolve \"./missing\"");
    }
    Ok(vec![scan.entry_point])
  }
}

/// Records registrations and lets tests fire change events by hand.
#[derive(Default)]
pub struct FakeWatcher {
  pub registrations: AtomicUsize,
  senders: Mutex<Vec<UnboundedSender<Vec<PathBuf>>>>,
}

impl FakeWatcher {
  pub fn emit(&self, path: &Path) {
    for sender in self.senders.lock().unwrap().iter() {
      let _ = sender.send(vec![path.to_path_buf()]);
    }
  }
}

impl FileWatcher for FakeWatcher {
  fn watch(
    &self,
    _paths: &[PathBuf],
    events: UnboundedSender<Vec<PathBuf>>,
  ) -> anyhow::Result<WatchGuard> {
    self.registrations.fetch_add(1, Ordering::SeqCst);
    self.senders.lock().unwrap().push(events);
    Ok(Box::new(()))
  }
}

/// Writes a fixed wrapped file and a map with a `sourceRoot`.
pub struct FakeOptimizer;

pub const OPTIMIZED_CODE: &str = "(function(){minified()})();";

#[async_trait]
impl LegacyOptimizer for FakeOptimizer {
  async fn optimize(&self, request: &LegacyRequest<'_>) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(request.dest_file.parent().unwrap()).await?;
    tokio::fs::write(request.dest_file, OPTIMIZED_CODE).await?;
    let map = serde_json::json!({
      "version": 3,
      "file": request.dest_file.file_name().unwrap().to_string_lossy(),
      "sourceRoot": request.source_root,
      "sources": ["src/amp.js"],
      "names": [],
      "mappings": "AAAA,YAAY",
    });
    tokio::fs::write(map_path_of(request.dest_file), map.to_string()).await?;
    Ok(())
  }
}

pub struct Fixture {
  pub dir: TempDir,
  pub engine: Arc<FakeEngine>,
  pub watcher: Arc<FakeWatcher>,
}

impl Fixture {
  pub fn new() -> Self {
    Self::with_engine(FakeEngine::default())
  }

  pub fn with_engine(engine: FakeEngine) -> Self {
    Self {
      dir: tempfile::tempdir().unwrap(),
      engine: Arc::new(engine),
      watcher: Arc::new(FakeWatcher::default()),
    }
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.dir.path().join(relative)
  }

  pub fn registry(&self, targets: &[(&str, TargetOptions)]) -> TargetRegistry {
    targets
      .iter()
      .map(|(name, options)| {
        let target = BuildTarget {
          src_dir: PathBuf::from("src"),
          src_filename: (*name).to_string(),
          dest_dir: PathBuf::from("dist"),
          minified_dest_dir: PathBuf::from("dist/v0"),
          options: options.clone(),
        };
        (*name, target)
      })
      .collect()
  }

  pub fn collaborators(&self) -> Collaborators {
    Collaborators {
      engine: Arc::clone(&self.engine) as _,
      compressor: Arc::new(OxcCompressor),
      watcher: Arc::clone(&self.watcher) as _,
      legacy_optimizer: None,
      prelude: Arc::new(NoPrelude),
    }
  }

  pub fn pipeline(&self, registry: TargetRegistry, options: PipelineOptions) -> Pipeline {
    self.pipeline_with(registry, options, self.collaborators())
  }

  pub fn pipeline_with(
    &self,
    registry: TargetRegistry,
    options: PipelineOptions,
    collaborators: Collaborators,
  ) -> Pipeline {
    let options = PipelineOptions { cwd: Some(self.dir.path().to_path_buf()), ..options };
    Pipeline::with_collaborators(registry, options, Arc::default(), collaborators).unwrap()
  }
}
