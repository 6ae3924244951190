use std::{
  path::{Path, PathBuf},
  process::Stdio,
  sync::Arc,
};

use amppack_common::ESTarget;
use amppack_sourcemap::SourceMapDocument;
use amppack_utils::path_ext::PathExt;
use anyhow::Context;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use sugar_path::SugarPath;
use tokio::process::Command;

use super::{
  apply_transforms, BundlerEngine, DependencyScan, EngineBuildOptions, EngineBuildResult,
  OutputFile, RebuildHandle,
};
use crate::{plugins::BundlerPlugin, utils::output::map_path_of};

/// Bundles by running the `esbuild` binary. Its output is written to a scratch
/// directory and read back, so nothing reaches the destination directory directly.
#[derive(Debug, Clone)]
pub struct EsbuildEngine {
  binary: PathBuf,
  cwd: PathBuf,
}

#[derive(Deserialize)]
struct Metafile {
  inputs: IndexMap<String, serde::de::IgnoredAny>,
}

impl EsbuildEngine {
  pub fn new(cwd: PathBuf) -> Self {
    Self { binary: PathBuf::from("esbuild"), cwd }
  }

  #[must_use]
  pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
    self.binary = binary.into();
    self
  }

  /// `--alias`/`--external` flags standing in for the plugins' resolve hooks.
  fn plugin_args(plugins: &[Arc<dyn BundlerPlugin>]) -> anyhow::Result<Vec<String>> {
    let mut args = Vec::new();
    for plugin in plugins {
      for specifier in plugin.intercepted_specifiers() {
        let Some(redirect) = plugin
          .resolve_id(&specifier)
          .with_context(|| format!("Plugin {} failed to resolve {specifier}", plugin.name()))?
        else {
          continue;
        };
        if redirect.external {
          args.push(format!("--external:{}", redirect.path));
        }
        if redirect.path != specifier {
          args.push(format!("--alias:{specifier}={}", redirect.path));
        }
      }
    }
    Ok(args)
  }

  fn build_args(options: &EngineBuildOptions, outfile: &Path) -> anyhow::Result<Vec<String>> {
    // esbuild cannot emit ES5 for most syntax, the downlevel plugin handles the rest.
    let target = match options.target {
      ESTarget::Es5 => ESTarget::Es2015,
      target => target,
    };
    let mut args = vec![
      options.entry_point.to_string_lossy().into_owned(),
      "--bundle".to_string(),
      "--sourcemap=external".to_string(),
      "--log-level=error".to_string(),
      format!("--format={}", options.format.as_str()),
      format!("--target={}", target.as_str()),
      format!("--outfile={}", outfile.to_string_lossy()),
    ];
    if !options.banner.is_empty() {
      args.push(format!("--banner:js={}", options.banner));
    }
    if !options.footer.is_empty() {
      args.push(format!("--footer:js={}", options.footer));
    }
    args.extend(options.defines.iter().map(|(key, value)| format!("--define:{key}={value}")));
    args.extend(options.external.iter().map(|dep| format!("--external:{dep}")));
    args.extend(Self::plugin_args(&options.plugins)?);
    Ok(args)
  }

  async fn run(&self, args: &[String]) -> anyhow::Result<()> {
    let output = Command::new(&self.binary)
      .args(args)
      .current_dir(&self.cwd)
      .stdin(Stdio::null())
      .output()
      .await
      .with_context(|| format!("Failed to spawn {}", self.binary.display()))?;
    if !output.status.success() {
      anyhow::bail!("{}", String::from_utf8_lossy(&output.stderr).trim());
    }
    Ok(())
  }

  async fn build_once(&self, options: &EngineBuildOptions) -> anyhow::Result<Vec<OutputFile>> {
    let scratch = tempfile::tempdir()?;
    let outfile = scratch.path().join(options.outfile.file_name_lossy().as_ref());
    self.run(&Self::build_args(options, &outfile)?).await?;

    let code = tokio::fs::read_to_string(&outfile).await?;
    let map = tokio::fs::read_to_string(map_path_of(&outfile)).await?;
    let dest_dir = self.cwd.join(options.outfile.parent().unwrap_or_else(|| Path::new("")));
    let map = rebase_sources(&map, scratch.path(), &dest_dir)?;
    let (code, map) = apply_transforms(&options.plugins, &options.outfile, code, map)?;

    Ok(vec![
      OutputFile { path: options.outfile.clone(), text: code },
      OutputFile { path: map_path_of(&options.outfile), text: map },
    ])
  }
}

/// esbuild names map sources relative to the file it wrote, which lives in the
/// scratch directory. Rewrites them relative to `to_dir`.
fn rebase_sources(map: &str, from_dir: &Path, to_dir: &Path) -> anyhow::Result<String> {
  let mut document = SourceMapDocument::from_json(map)?;
  for source in &mut document.sources {
    let absolute = Path::new(source.as_str()).absolutize_with(from_dir);
    *source = absolute.relative(to_dir).as_path().to_slash_lossy().into_owned();
  }
  document.to_json_string()
}

struct EsbuildRebuild {
  engine: EsbuildEngine,
  options: EngineBuildOptions,
}

#[async_trait]
impl RebuildHandle for EsbuildRebuild {
  async fn rebuild(&mut self) -> anyhow::Result<Vec<OutputFile>> {
    self.engine.build_once(&self.options).await
  }
}

#[async_trait]
impl BundlerEngine for EsbuildEngine {
  async fn build(&self, options: EngineBuildOptions) -> anyhow::Result<EngineBuildResult> {
    let output_files = self.build_once(&options).await?;
    let rebuild = options.incremental.then(|| {
      Box::new(EsbuildRebuild { engine: self.clone(), options }) as Box<dyn RebuildHandle>
    });
    Ok(EngineBuildResult { output_files, rebuild })
  }

  async fn dependencies(&self, scan: DependencyScan) -> anyhow::Result<Vec<PathBuf>> {
    let scratch = tempfile::tempdir()?;
    let metafile = scratch.path().join("meta.json");
    let mut args = vec![
      scan.entry_point.to_string_lossy().into_owned(),
      "--bundle".to_string(),
      "--log-level=error".to_string(),
      format!("--outfile={}", scratch.path().join("out.js").to_string_lossy()),
      format!("--metafile={}", metafile.to_string_lossy()),
    ];
    args.extend(Self::plugin_args(&scan.plugins)?);
    self.run(&args).await?;

    let metafile: Metafile = serde_json::from_str(&tokio::fs::read_to_string(&metafile).await?)?;
    Ok(metafile.inputs.into_keys().map(|input| self.cwd.join(input)).collect())
  }
}
