use std::{
  path::{Path, PathBuf},
  process::Stdio,
  time::Instant,
};

use amppack_common::{BundleOptions, ESTarget, OutputFormat, CONTENTS_PLACEHOLDER};
use amppack_error::PipelineError;
use amppack_sourcemap::{massage, MassageOptions};
use amppack_utils::naming::maybe_to_esm_name;
use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use crate::{
  pipeline::{CompileJob, PipelineInner},
  stages::splice::combine_with_compiled_file,
  utils::{bundle_error::handle_bundle_error, log::end_build_step, output::map_path_of},
};

pub struct LegacyRequest<'a> {
  pub entry_point: &'a Path,
  pub src_dir: &'a Path,
  /// Receives the code; the map goes to `<dest_file>.map`.
  pub dest_file: &'a Path,
  pub options: &'a BundleOptions,
  pub target: ESTarget,
  pub source_root: &'a str,
  pub full_sourcemaps: bool,
}

/// Whole-program optimizer used for minified builds in legacy mode. It writes its
/// output pair itself.
#[async_trait]
pub trait LegacyOptimizer: Send + Sync {
  async fn optimize(&self, request: &LegacyRequest<'_>) -> anyhow::Result<()>;
}

/// Runs the `google-closure-compiler` binary in advanced mode.
#[derive(Debug, Clone)]
pub struct ClosureCompiler {
  binary: PathBuf,
  cwd: PathBuf,
}

impl ClosureCompiler {
  pub fn new(cwd: PathBuf) -> Self {
    Self { binary: PathBuf::from("google-closure-compiler"), cwd }
  }

  #[must_use]
  pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
    self.binary = binary.into();
    self
  }

  fn args(request: &LegacyRequest<'_>) -> Vec<String> {
    let language_out = match request.target {
      ESTarget::Es5 => "ECMASCRIPT5",
      _ => "ECMASCRIPT_2015",
    };
    let mut args = vec![
      "--compilation_level=ADVANCED".to_string(),
      format!("--language_out={language_out}"),
      "--module_resolution=NODE".to_string(),
      "--dependency_mode=PRUNE".to_string(),
      format!("--js={}", request.src_dir.join("**.js").to_string_lossy()),
      format!("--entry_point={}", request.entry_point.to_string_lossy()),
      format!("--js_output_file={}", request.dest_file.to_string_lossy()),
      format!("--create_source_map={}", map_path_of(request.dest_file).to_string_lossy()),
      format!("--output_wrapper={}", request.options.wrapper.replace(CONTENTS_PLACEHOLDER, "%output%")),
    ];
    if request.options.output_format == OutputFormat::Esm {
      args.push("--chunk_output_type=ES_MODULES".to_string());
    }
    if request.full_sourcemaps {
      args.push("--source_map_include_content".to_string());
    }
    args
  }
}

#[async_trait]
impl LegacyOptimizer for ClosureCompiler {
  async fn optimize(&self, request: &LegacyRequest<'_>) -> anyhow::Result<()> {
    if let Some(parent) = request.dest_file.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let output = Command::new(&self.binary)
      .args(Self::args(request))
      .current_dir(&self.cwd)
      .stdin(Stdio::null())
      .output()
      .await
      .with_context(|| format!("Failed to spawn {}", self.binary.display()))?;
    if !output.status.success() {
      anyhow::bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
    }

    let map_file = map_path_of(request.dest_file);
    let map = tokio::fs::read_to_string(&map_file).await?;
    let map = massage(
      &map,
      &MassageOptions { source_root: request.source_root, full_sourcemaps: request.full_sourcemaps },
    )?;
    tokio::fs::write(&map_file, map).await?;
    Ok(())
  }
}

/// Minifies one entry point with the legacy optimizer, then splices in its
/// pre-built files and writes the alias copy.
pub(crate) async fn compile_minified_js(
  inner: &PipelineInner,
  job: &CompileJob,
) -> anyhow::Result<()> {
  let start = Instant::now();
  let entry_point = job.entry_point();
  let esm = inner.options.esm;
  let minified_name =
    maybe_to_esm_name(job.options.minified_name.as_deref().unwrap_or(&job.src_filename), esm)
      .into_owned();

  let Some(optimizer) = &inner.collaborators.legacy_optimizer else {
    return Err(PipelineError::MissingLegacyOptimizer { dest_filename: minified_name }.into());
  };

  let entry = inner.entry_state(&entry_point);
  let _serialized = entry.lock().await;

  let dest_file = job.dest_dir.join(&minified_name);
  let source_root = inner.options.source_root_for(&job.options);
  let request = LegacyRequest {
    entry_point: &entry_point,
    src_dir: &job.src_dir,
    dest_file: &dest_file,
    options: &job.options,
    target: inner.target(),
    source_root: &source_root,
    full_sourcemaps: inner.options.full_sourcemaps,
  };
  if let Err(err) = optimizer.optimize(&request).await {
    return handle_bundle_error(&err, job.options.continues_on_error(), &minified_name);
  }

  combine_with_compiled_file(inner, &job.src_filename, &dest_file, &job.options).await?;

  let mut name = minified_name;
  if let Some(alias_name) = &job.options.alias_name {
    let alias_name = maybe_to_esm_name(alias_name, esm);
    tokio::fs::copy(&dest_file, job.dest_dir.join(alias_name.as_ref())).await?;
    name = format!("{name} → {alias_name}");
  }
  end_build_step("Minified", &name, start);
  Ok(())
}

#[test]
fn closure_args_follow_the_request() {
  let options = BundleOptions {
    wrapper: "(function(){<%= contents %>})();".to_string(),
    output_format: OutputFormat::Esm,
    ..BundleOptions::default()
  };
  let request = LegacyRequest {
    entry_point: Path::new("src/amp.js"),
    src_dir: Path::new("src"),
    dest_file: Path::new("dist/v0.js"),
    options: &options,
    target: ESTarget::Es5,
    source_root: "/",
    full_sourcemaps: false,
  };

  let args = ClosureCompiler::args(&request);
  assert!(args.contains(&"--language_out=ECMASCRIPT5".to_string()));
  assert!(args.contains(&"--output_wrapper=(function(){%output%})();".to_string()));
  assert!(args.contains(&"--create_source_map=dist/v0.js.map".to_string()));
  assert!(args.contains(&"--chunk_output_type=ES_MODULES".to_string()));
  assert!(!args.contains(&"--source_map_include_content".to_string()));
}
