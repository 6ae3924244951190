use std::{
  path::{Path, PathBuf},
  sync::{Arc, Mutex as StdMutex, PoisonError},
};

use amppack_common::{
  BundleOptions, ESTarget, NormalizedPipelineOptions, PipelineOptions, TargetOptions,
  TargetRegistry, WatchBuild,
};
use amppack_ecmascript::MinifyOptions;
use amppack_error::{BuildError, BuildResult, PipelineError};
use amppack_resolver::Resolver;
use anyhow::Context;
use dashmap::DashMap;
use futures::future::{join_all, try_join_all};
use regex::Regex;
use tokio::sync::Mutex;

use crate::{
  compressor::{Compressor, OxcCompressor},
  engine::{BundlerEngine, EsbuildEngine},
  prelude::{ConfigPrelude, JsonConfigPrelude, NoPrelude},
  stages::{
    bundle,
    legacy::{self, ClosureCompiler, LegacyOptimizer},
  },
  state::{BuildState, EntryBuildState},
  utils::normalize_options::normalize_options,
  watch::{self, FileWatcher, NotifyWatcher, WatchSession},
};

/// How [`Pipeline::build_many`] reports failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOut {
  /// Stop at the first failed target.
  FailFast,
  /// Build every target and report all failures together.
  CollectAll,
}

/// The external tools a pipeline drives.
#[derive(Clone)]
pub struct Collaborators {
  pub engine: Arc<dyn BundlerEngine>,
  pub compressor: Arc<dyn Compressor>,
  pub watcher: Arc<dyn FileWatcher>,
  pub legacy_optimizer: Option<Arc<dyn LegacyOptimizer>>,
  pub prelude: Arc<dyn ConfigPrelude>,
}

impl Collaborators {
  pub fn new(options: &NormalizedPipelineOptions) -> Self {
    let prelude: Arc<dyn ConfigPrelude> = match &options.config {
      Some(config) => Arc::new(JsonConfigPrelude::new(config.clone(), &options.config_global)),
      None => Arc::new(NoPrelude),
    };
    Self {
      engine: Arc::new(EsbuildEngine::new(options.cwd.clone())),
      compressor: Arc::new(OxcCompressor),
      watcher: Arc::new(NotifyWatcher),
      legacy_optimizer: Some(Arc::new(ClosureCompiler::new(options.cwd.clone()))),
      prelude,
    }
  }
}

/// One entry point to compile and the options to compile it with.
#[derive(Debug, Clone)]
pub(crate) struct CompileJob {
  pub src_dir: PathBuf,
  pub src_filename: String,
  pub dest_dir: PathBuf,
  pub options: BundleOptions,
}

impl CompileJob {
  pub fn entry_point(&self) -> PathBuf {
    self.src_dir.join(&self.src_filename)
  }
}

/// Level the bundled output is lowered to.
fn output_target(esm: bool) -> ESTarget {
  if esm {
    ESTarget::Es2015
  } else {
    ESTarget::Es5
  }
}

pub(crate) struct PipelineInner {
  pub options: NormalizedPipelineOptions,
  pub registry: TargetRegistry,
  pub collaborators: Collaborators,
  pub state: Arc<BuildState>,
  pub resolver: Arc<Resolver>,
  pub minify_options: MinifyOptions,
  entries: DashMap<PathBuf, Arc<Mutex<EntryBuildState>>>,
  watch_sessions: StdMutex<Vec<WatchSession>>,
}

impl PipelineInner {
  pub fn target(&self) -> ESTarget {
    output_target(self.options.esm)
  }

  pub fn entry_state(&self, entry_point: &Path) -> Arc<Mutex<EntryBuildState>> {
    Arc::clone(self.entries.entry(entry_point.to_path_buf()).or_default().value())
  }

  pub fn add_watch_session(&self, session: WatchSession) {
    self.watch_sessions.lock().unwrap_or_else(PoisonError::into_inner).push(session);
  }
}

/// Builds targets of a [`TargetRegistry`]. Cloning is cheap and clones share
/// their state.
#[derive(Clone)]
pub struct Pipeline {
  pub(crate) inner: Arc<PipelineInner>,
}

impl Pipeline {
  pub fn new(
    registry: TargetRegistry,
    options: PipelineOptions,
    state: Arc<BuildState>,
  ) -> anyhow::Result<Self> {
    let options = normalize_options(options);
    let collaborators = Collaborators::new(&options);
    Self::build_with(registry, options, state, collaborators)
  }

  pub fn with_collaborators(
    registry: TargetRegistry,
    options: PipelineOptions,
    state: Arc<BuildState>,
    collaborators: Collaborators,
  ) -> anyhow::Result<Self> {
    Self::build_with(registry, normalize_options(options), state, collaborators)
  }

  fn build_with(
    registry: TargetRegistry,
    options: NormalizedPipelineOptions,
    state: Arc<BuildState>,
    collaborators: Collaborators,
  ) -> anyhow::Result<Self> {
    let private_property_pattern = Regex::new(&options.private_property_pattern)
      .with_context(|| format!("Invalid private property pattern {}", options.private_property_pattern))?;
    let target = output_target(options.esm);
    let minify_options = MinifyOptions {
      passes: options.compress_passes as usize,
      pretty_print: options.pretty_print,
      module: options.esm,
      private_property_pattern,
      target: target.into(),
    };
    let resolver = Arc::new(Resolver::new(options.cwd.clone()));

    Ok(Self {
      inner: Arc::new(PipelineInner {
        options,
        registry,
        collaborators,
        state,
        resolver,
        minify_options,
        entries: DashMap::default(),
        watch_sessions: StdMutex::default(),
      }),
    })
  }

  pub fn options(&self) -> &NormalizedPipelineOptions {
    &self.inner.options
  }

  pub fn state(&self) -> &Arc<BuildState> {
    &self.inner.state
  }

  /// Builds the target registered as `target_name`, `overrides` winning over the
  /// target's own options.
  pub async fn build(&self, target_name: &str, overrides: &TargetOptions) -> BuildResult<()> {
    let target = self
      .inner
      .registry
      .get(target_name)
      .ok_or_else(|| PipelineError::TargetNotFound { name: target_name.to_string() })?;

    let options = BundleOptions::from(target.options.merge(overrides));
    let cwd = &self.inner.options.cwd;
    let src_dir = cwd.join(&target.src_dir);
    let dest_dir = cwd.join(target.dest_dir_for(options.minify));
    self.compile_js(&src_dir, &target.src_filename, &dest_dir, options).await
  }

  /// Builds `target_names` concurrently.
  pub async fn build_many<S: AsRef<str>>(
    &self,
    target_names: &[S],
    overrides: &TargetOptions,
    fan_out: FanOut,
  ) -> BuildResult<()> {
    let builds = target_names.iter().map(|name| self.build(name.as_ref(), overrides));
    match fan_out {
      FanOut::FailFast => try_join_all(builds).await.map(|_| ()),
      FanOut::CollectAll => {
        let errors = join_all(builds)
          .await
          .into_iter()
          .filter_map(Result::err)
          .flat_map(|error| error.0)
          .collect::<Vec<_>>();
        if errors.is_empty() {
          Ok(())
        } else {
          Err(BuildError(errors))
        }
      }
    }
  }

  /// Compiles one entry point. A watched entry point is compiled once here and
  /// afterwards only by its watcher, so later calls for it return right away.
  pub async fn compile_js(
    &self,
    src_dir: &Path,
    src_filename: &str,
    dest_dir: &Path,
    options: BundleOptions,
  ) -> BuildResult<()> {
    let job = CompileJob {
      src_dir: src_dir.to_path_buf(),
      src_filename: src_filename.to_string(),
      dest_dir: dest_dir.to_path_buf(),
      options,
    };
    let entry_point = job.entry_point();
    if self.inner.state.is_watched(&entry_point) {
      return Ok(());
    }

    if job.options.watch {
      if !self.inner.state.start_watching(entry_point.clone()) {
        return Ok(());
      }
      if let Err(err) = watch::enter_watch_mode(&self.inner, &job).await {
        self.inner.state.stop_watching(&entry_point);
        return Err(err.into());
      }
    }

    self.do_compile_js(&job).await
  }

  pub(crate) async fn do_compile_js(&self, job: &CompileJob) -> BuildResult<()> {
    let inner = &*self.inner;
    let outcome = if job.options.minify && inner.options.use_legacy_optimizer {
      legacy::compile_minified_js(inner, job).await
    } else {
      bundle::bundle(inner, job).await
    }
    .map_err(BuildError::from);

    if let Some(hook) = &inner.options.on_watch_build {
      hook(&WatchBuild { entry_point: &job.entry_point(), outcome: &outcome });
    }
    outcome
  }
}

#[cfg(test)]
mod tests {
  use std::{
    path::PathBuf,
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc,
    },
    time::Duration,
  };

  use amppack_common::{PipelineOptions, TargetOptions, WatchBuild};
  use amppack_error::PipelineError;
  use amppack_sourcemap::SourceMapDocument;

  use super::{Collaborators, FanOut};
  use crate::{
    test_utils::{FakeEngine, FakeOptimizer, Fixture, OPTIMIZED_CODE},
    utils::normalize_options::normalize_options,
  };

  fn read_map(path: PathBuf) -> SourceMapDocument {
    SourceMapDocument::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
  }

  #[tokio::test]
  async fn unknown_target_is_reported_by_name() {
    let fixture = Fixture::new();
    let pipeline = fixture.pipeline(fixture.registry(&[]), PipelineOptions::default());

    let err = pipeline.build("amp-missing.js", &TargetOptions::default()).await.unwrap_err();
    assert!(matches!(
      err.pipeline_errors().next(),
      Some(PipelineError::TargetNotFound { name }) if name == "amp-missing.js"
    ));
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn fan_out_writes_a_pair_per_target() {
    let fixture = Fixture::new();
    let names = ["amp-a.js", "amp-b.js", "amp-c.js"];
    let registry = fixture
      .registry(&names.iter().map(|name| (*name, TargetOptions::default())).collect::<Vec<_>>());
    let pipeline = fixture.pipeline(registry, PipelineOptions::default());

    pipeline.build_many(&names, &TargetOptions::default(), FanOut::CollectAll).await.unwrap();

    for name in names {
      let code = fixture.path("dist").join(name);
      assert!(code.exists(), "{name} was not written");
      let map = read_map(fixture.path(&format!("dist/{name}.map")));
      assert_eq!(map.file.as_deref(), Some(name));
    }
  }

  #[tokio::test]
  async fn collect_all_reports_every_failure() {
    let fixture = Fixture::new();
    let pipeline =
      fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), PipelineOptions::default());

    let err = pipeline
      .build_many(&["amp-x.js", "amp-a.js", "amp-y.js"], &TargetOptions::default(), FanOut::CollectAll)
      .await
      .unwrap_err();
    assert_eq!(err.len(), 2);
    assert!(fixture.path("dist/amp-a.js").exists());

    let err = pipeline
      .build_many(&["amp-x.js", "amp-y.js"], &TargetOptions::default(), FanOut::FailFast)
      .await
      .unwrap_err();
    assert_eq!(err.len(), 1);
  }

  #[tokio::test]
  async fn failed_bundle_is_fatal_unless_continuing() {
    let fixture = Fixture::new();
    fixture.engine.calls.fail_builds.store(true, Ordering::SeqCst);
    let pipeline =
      fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), PipelineOptions::default());

    let err = pipeline.build("amp-a.js", &TargetOptions::default()).await.unwrap_err();
    match err.pipeline_errors().next() {
      Some(PipelineError::BundleFailed { dest_filename, message }) => {
        assert_eq!(dest_filename, "amp-a.js");
        assert!(!message.contains("    at "));
      }
      other => panic!("unexpected error {other:?}"),
    }

    let overrides = TargetOptions { continue_on_error: Some(true), ..TargetOptions::default() };
    pipeline.build("amp-a.js", &overrides).await.unwrap();
    assert!(!fixture.path("dist/amp-a.js").exists());
    assert!(!fixture.path("dist/amp-a.js.map").exists());
  }

  #[tokio::test]
  async fn second_build_reuses_the_rebuild_handle() {
    let fixture = Fixture::new();
    let pipeline =
      fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), PipelineOptions::default());

    pipeline.build("amp-a.js", &TargetOptions::default()).await.unwrap();
    pipeline.build("amp-a.js", &TargetOptions::default()).await.unwrap();

    assert_eq!(fixture.engine.calls.builds.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.engine.calls.rebuilds.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(flavor = "multi_thread")]
  async fn watching_twice_registers_once_and_debounces_changes() {
    let fixture = Fixture::new();
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    let options = PipelineOptions {
      watch_debounce_ms: Some(50),
      on_watch_build: Some(Arc::new(move |_: &WatchBuild<'_>| {
        counter.fetch_add(1, Ordering::SeqCst);
      })),
      ..PipelineOptions::default()
    };
    let pipeline = fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), options);
    let watch = TargetOptions { watch: Some(true), ..TargetOptions::default() };

    pipeline.build("amp-a.js", &watch).await.unwrap();
    pipeline.build("amp-a.js", &watch).await.unwrap();
    assert_eq!(fixture.watcher.registrations.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.state().watched_len(), 1);
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    let entry_point = fixture.path("src/amp-a.js");
    for _ in 0..5 {
      fixture.watcher.emit(&entry_point);
    }
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert_eq!(fixture.engine.calls.builds.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.engine.calls.rebuilds.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn failed_dependency_scan_leaves_entry_unwatched() {
    let fixture = Fixture::new();
    fixture.engine.calls.fail_scans.store(true, Ordering::SeqCst);
    let pipeline =
      fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), PipelineOptions::default());
    let watch = TargetOptions { watch: Some(true), ..TargetOptions::default() };

    let err = pipeline.build("amp-a.js", &watch).await.unwrap_err();
    assert!(matches!(
      err.pipeline_errors().next(),
      Some(PipelineError::DependencyDiscoveryFailed { .. })
    ));
    assert_eq!(pipeline.state().watched_len(), 0);
    assert_eq!(fixture.watcher.registrations.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.engine.calls.scans.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.engine.calls.builds.load(Ordering::SeqCst), 0);

    fixture.engine.calls.fail_scans.store(false, Ordering::SeqCst);
    pipeline.build("amp-a.js", &watch).await.unwrap();
    assert_eq!(pipeline.state().watched_len(), 1);
  }

  #[tokio::test]
  async fn minified_bundle_is_published_against_source_root() {
    let fixture = Fixture::new();
    let pipeline =
      fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), PipelineOptions::default());

    let minify = TargetOptions { minify: Some(true), ..TargetOptions::default() };
    pipeline.build("amp-a.js", &minify).await.unwrap();

    let code = std::fs::read_to_string(fixture.path("dist/v0/amp-a.js")).unwrap();
    assert!(!code.contains("answer_AMP_PRIVATE_"));
    let map = read_map(fixture.path("dist/v0/amp-a.js.map"));
    assert_eq!(map.source_root.as_deref(), Some("/"));
    assert_eq!(map.file.as_deref(), Some("amp-a.js"));
    assert!(map.sources.iter().all(|source| !source.starts_with("../")));
    assert!(map.sources_content.is_none());
  }

  #[tokio::test]
  async fn property_names_persist_while_variables_reset() {
    let engine = FakeEngine::default()
      .with_body("amp-a.js", "window.a.shared_AMP_PRIVATE_ = 1;\n")
      .with_body("amp-b.js", "window.b.shared_AMP_PRIVATE_ = 2;\n");
    let fixture = Fixture::with_engine(engine);
    let registry = fixture
      .registry(&[("amp-a.js", TargetOptions::default()), ("amp-b.js", TargetOptions::default())]);
    let pipeline = fixture.pipeline(registry, PipelineOptions::default());
    let minify = TargetOptions { minify: Some(true), ..TargetOptions::default() };

    pipeline.build("amp-a.js", &minify).await.unwrap();
    let name_cache = &pipeline.state().name_cache;
    let mangled = name_cache.props.get("shared_AMP_PRIVATE_").unwrap();
    name_cache.vars.lock().await.insert("stale".to_string(), "s".to_string());

    pipeline.build("amp-b.js", &minify).await.unwrap();
    assert_eq!(name_cache.props.get("shared_AMP_PRIVATE_"), Some(mangled.clone()));
    assert!(name_cache.vars.lock().await.get("stale").is_none());

    for name in ["amp-a.js", "amp-b.js"] {
      let code = std::fs::read_to_string(fixture.path("dist/v0").join(name)).unwrap();
      assert!(code.contains(&format!(".{mangled}")), "{name}: {code}");
    }
  }

  #[tokio::test]
  async fn local_names_are_chosen_per_bundle() {
    let bodies = [
      ("amp-a.js", "let onlyInA = window.start();\nwindow.a = onlyInA;\nwindow.b = onlyInA;\n"),
      ("amp-b.js", "let onlyInB = window.stop();\nwindow.a = onlyInB;\nwindow.b = onlyInB;\n"),
    ];
    let engine = || {
      bodies.iter().fold(FakeEngine::default(), |engine, (name, body)| engine.with_body(name, body))
    };
    let options = || PipelineOptions { esm: Some(true), ..PipelineOptions::default() };
    let minify = TargetOptions { minify: Some(true), ..TargetOptions::default() };

    let fixture = Fixture::with_engine(engine());
    let registry = fixture
      .registry(&[("amp-a.js", TargetOptions::default()), ("amp-b.js", TargetOptions::default())]);
    let pipeline = fixture.pipeline(registry, options());
    let name_cache = &pipeline.state().name_cache;

    pipeline.build("amp-a.js", &minify).await.unwrap();
    let renamed = name_cache.vars.lock().await.get("onlyInA").map(ToString::to_string).unwrap();
    assert_ne!(renamed, "onlyInA");
    let code = std::fs::read_to_string(fixture.path("dist/v0/amp-a.js")).unwrap();
    assert!(!code.contains("onlyInA"), "{code}");

    pipeline.build("amp-b.js", &minify).await.unwrap();
    {
      let vars = name_cache.vars.lock().await;
      assert!(vars.get("onlyInA").is_none());
      assert!(vars.get("onlyInB").is_some());
    }

    // Building amp-b.js on its own picks the same names.
    let alone = Fixture::with_engine(engine());
    let pipeline = alone.pipeline(alone.registry(&[("amp-b.js", TargetOptions::default())]), options());
    pipeline.build("amp-b.js", &minify).await.unwrap();
    assert_eq!(
      std::fs::read_to_string(alone.path("dist/v0/amp-b.js")).unwrap(),
      std::fs::read_to_string(fixture.path("dist/v0/amp-b.js")).unwrap()
    );
  }

  #[tokio::test]
  async fn runtime_config_and_defines_reach_the_bundle() {
    let fixture = Fixture::new();
    std::fs::write(fixture.path("prod-config.json"), r#"{ "canary": 0 }"#).unwrap();
    let options = PipelineOptions {
      cwd: Some(fixture.dir.path().to_path_buf()),
      config: Some(PathBuf::from("prod-config.json")),
      defines: Some([("IS_PROD".to_string(), "true".to_string())].into_iter().collect()),
      ..PipelineOptions::default()
    };
    let prelude = Collaborators::new(&normalize_options(options.clone())).prelude;
    let collaborators = Collaborators { prelude, ..fixture.collaborators() };
    let registry = fixture.registry(&[("amp-a.js", TargetOptions::default())]);
    let pipeline = fixture.pipeline_with(registry, options, collaborators);

    pipeline.build("amp-a.js", &TargetOptions::default()).await.unwrap();
    let code = std::fs::read_to_string(fixture.path("dist/amp-a.js")).unwrap();
    assert!(code.starts_with(r#"self.AMP_CONFIG||(self.AMP_CONFIG={"canary":0});/*AMP_CONFIG*/"#), "{code}");
    let defines = fixture.engine.calls.last_defines.lock().unwrap().clone();
    assert_eq!(defines.get("IS_PROD").map(String::as_str), Some("true"));
  }

  #[tokio::test]
  async fn legacy_minify_requires_an_optimizer() {
    let fixture = Fixture::new();
    let options = PipelineOptions { use_legacy_optimizer: Some(true), ..PipelineOptions::default() };
    let pipeline = fixture.pipeline(fixture.registry(&[("amp-a.js", TargetOptions::default())]), options);

    let minify = TargetOptions { minify: Some(true), ..TargetOptions::default() };
    let err = pipeline.build("amp-a.js", &minify).await.unwrap_err();
    assert!(matches!(
      err.pipeline_errors().next(),
      Some(PipelineError::MissingLegacyOptimizer { dest_filename }) if dest_filename == "amp-a.js"
    ));
  }

  #[tokio::test]
  async fn legacy_minify_splices_auxiliary_files_inside_the_wrapper() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.path("aux")).unwrap();
    std::fs::write(fixture.path("aux/a.js"), "A()").unwrap();
    std::fs::write(fixture.path("aux/b.js"), "B()").unwrap();
    let options = PipelineOptions {
      use_legacy_optimizer: Some(true),
      auxiliary_bundles: Some(
        [("amp-a.js".to_string(), vec![PathBuf::from("aux/a.js"), PathBuf::from("aux/b.js")])]
          .into_iter()
          .collect(),
      ),
      ..PipelineOptions::default()
    };
    let target = TargetOptions {
      wrapper: Some("(function(){<%= contents %>})();".to_string()),
      minified_name: Some("v0.js".to_string()),
      alias_name: Some("v0-alias.js".to_string()),
      ..TargetOptions::default()
    };
    let collaborators = crate::Collaborators {
      legacy_optimizer: Some(Arc::new(FakeOptimizer)),
      ..fixture.collaborators()
    };
    let pipeline =
      fixture.pipeline_with(fixture.registry(&[("amp-a.js", target)]), options, collaborators);

    let minify = TargetOptions { minify: Some(true), ..TargetOptions::default() };
    pipeline.build("amp-a.js", &minify).await.unwrap();

    let code = std::fs::read_to_string(fixture.path("dist/v0/v0.js")).unwrap();
    assert_ne!(code, OPTIMIZED_CODE);
    assert_eq!(code, "(function(){\nA();\nB();\nminified()})();");
    assert_eq!(std::fs::read_to_string(fixture.path("dist/v0/v0-alias.js")).unwrap(), code);

    let map = read_map(fixture.path("dist/v0/v0.js.map"));
    assert_eq!(map.source_root.as_deref(), Some("/"));
    assert!(map.sources.iter().any(|source| source == "src/amp.js"));
    assert!(map.sources.iter().any(|source| source == "aux/a.js"));
    assert!(map.sources_content.is_none());
  }
}
