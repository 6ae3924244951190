mod esbuild;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use amppack_common::{ESTarget, OutputFormat};
use async_trait::async_trait;
use indexmap::IndexMap;

use crate::plugins::BundlerPlugin;

pub use self::esbuild::EsbuildEngine;

/// Everything the engine needs for a full build of one entry point.
#[derive(Clone)]
pub struct EngineBuildOptions {
  pub entry_point: PathBuf,
  pub outfile: PathBuf,
  pub format: OutputFormat,
  pub target: ESTarget,
  pub banner: String,
  pub footer: String,
  pub external: Vec<String>,
  /// Identifier -> replacement expression.
  pub defines: IndexMap<String, String>,
  pub plugins: Vec<Arc<dyn BundlerPlugin>>,
  /// Ask for a [`RebuildHandle`] along with the first result.
  pub incremental: bool,
}

/// A file the engine produced in memory.
#[derive(Debug, Clone)]
pub struct OutputFile {
  pub path: PathBuf,
  pub text: String,
}

impl OutputFile {
  pub fn is_sourcemap(&self) -> bool {
    self.path.extension().is_some_and(|ext| ext == "map")
  }
}

pub struct EngineBuildResult {
  pub output_files: Vec<OutputFile>,
  pub rebuild: Option<Box<dyn RebuildHandle>>,
}

/// Metadata-only build used to find the files an entry point depends on.
pub struct DependencyScan {
  pub entry_point: PathBuf,
  pub plugins: Vec<Arc<dyn BundlerPlugin>>,
}

/// Re-runs a previous build with its original configuration.
#[async_trait]
pub trait RebuildHandle: Send {
  async fn rebuild(&mut self) -> anyhow::Result<Vec<OutputFile>>;
}

#[async_trait]
pub trait BundlerEngine: Send + Sync {
  async fn build(&self, options: EngineBuildOptions) -> anyhow::Result<EngineBuildResult>;

  /// Transitive input files of `scan.entry_point`, entry point included.
  async fn dependencies(&self, scan: DependencyScan) -> anyhow::Result<Vec<PathBuf>>;
}

/// Applies every plugin's `transform` to a bundled file, in order.
pub(crate) fn apply_transforms(
  plugins: &[Arc<dyn BundlerPlugin>],
  path: &Path,
  code: String,
  map: String,
) -> anyhow::Result<(String, String)> {
  let id = path.to_string_lossy();
  let mut code = code;
  let mut maps = vec![map];
  for plugin in plugins {
    if let Some(output) = plugin.transform(&id, &code)? {
      code = output.code;
      if let Some(map) = output.map {
        maps.push(map);
      }
    }
  }
  if maps.len() == 1 {
    return Ok((code, maps.remove(0)));
  }
  let map = amppack_sourcemap::compose_chain(&maps, false)?;
  Ok((code, map.to_json_string()?))
}
