use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Instant,
};

use amppack_common::{split_wrapper, BundleOptions, CompiledArtifact, SplitWrapper};
use amppack_error::PipelineError;
use amppack_sourcemap::{massage, MassageOptions, SourceMapDocument};
use amppack_utils::naming::{alias_filename, dest_filename};

use crate::{
  engine::{EngineBuildOptions, OutputFile},
  pipeline::{CompileJob, PipelineInner},
  plugins::{BundlerPlugin, DownlevelPlugin, RemapDependenciesPlugin},
  stages::minify::minify,
  state::EntryBuildState,
  utils::{
    bundle_error::handle_bundle_error,
    log::end_build_step,
    output::{read_auxiliary_content, write_output_pair},
  },
};

/// The downlevel plugin, preceded by the remap plugin when the target remaps
/// dependencies.
pub(crate) fn plugin_chain(
  inner: &PipelineInner,
  options: &BundleOptions,
) -> Vec<Arc<dyn BundlerPlugin>> {
  let mut plugins: Vec<Arc<dyn BundlerPlugin>> =
    vec![Arc::new(DownlevelPlugin::new(inner.target(), inner.options.esm))];
  if !options.remap_dependencies.is_empty() {
    plugins.insert(
      0,
      Arc::new(RemapDependenciesPlugin::new(
        options.remap_dependencies.clone(),
        options.external_dependencies.clone(),
        Arc::clone(&inner.resolver),
      )),
    );
  }
  plugins
}

async fn engine_options(
  inner: &PipelineInner,
  job: &CompileJob,
  dest_file: &Path,
  dest_filename: &str,
) -> anyhow::Result<EngineBuildOptions> {
  let SplitWrapper { banner, footer } = split_wrapper(&job.options.wrapper);
  let config = inner.collaborators.prelude.prelude(dest_filename, &job.options).await?;
  let auxiliary = read_auxiliary_content(&inner.options, &job.src_filename).await?;

  Ok(EngineBuildOptions {
    entry_point: job.entry_point(),
    outfile: dest_file.to_path_buf(),
    format: job.options.output_format,
    target: inner.target(),
    banner: format!("{config}{banner}{auxiliary}"),
    footer: footer.to_string(),
    external: job.options.external_dependencies.clone(),
    defines: inner.options.defines.clone(),
    plugins: plugin_chain(inner, &job.options),
    incremental: job.options.watch,
  })
}

/// Separates the engine output into code and map. The map is stamped with the
/// name the code is written under.
fn split_outputs(
  output_files: Vec<OutputFile>,
  entry_point: &Path,
  dest_filename: &str,
) -> anyhow::Result<CompiledArtifact> {
  let (maps, code): (Vec<_>, Vec<_>) = output_files.into_iter().partition(OutputFile::is_sourcemap);
  let missing = |kind| PipelineError::MissingOutput { entry_point: entry_point.to_path_buf(), kind };
  let code = code.into_iter().next().ok_or_else(|| missing("code"))?;
  let map = maps.into_iter().next().ok_or_else(|| missing("sourcemap"))?;

  let mut document = SourceMapDocument::from_json(&map.text)?;
  document.file = Some(dest_filename.to_string());
  Ok(CompiledArtifact::new(code.text, document.to_json_string()?))
}

async fn finish_bundle(
  inner: &PipelineInner,
  dest_dir: &Path,
  dest_filename: &str,
  options: &BundleOptions,
  start: Instant,
) -> anyhow::Result<()> {
  let step_name = if options.minify { "Minified" } else { "Compiled" };
  if let Some(alias_name) = &options.alias_name {
    let alias_name = alias_filename(alias_name, options.minify, inner.options.esm);
    tokio::fs::copy(dest_dir.join(dest_filename), dest_dir.join(&alias_name)).await?;
    end_build_step(step_name, &format!("{dest_filename} → {alias_name}"), start);
  } else {
    let logging_name = match &options.name {
      Some(name) if options.npm && !dest_filename.starts_with("amp-") => {
        format!("{name} → {dest_filename}")
      }
      _ => dest_filename.to_string(),
    };
    end_build_step(step_name, &logging_name, start);
  }
  Ok(())
}

async fn build(
  inner: &PipelineInner,
  job: &CompileJob,
  dest_file: &Path,
  dest_filename: &str,
  start: Instant,
) -> anyhow::Result<()> {
  let entry_point = job.entry_point();
  let entry = inner.entry_state(&entry_point);
  let mut entry = entry.lock().await;

  let output_files = match std::mem::take(&mut *entry) {
    EntryBuildState::Built(mut handle) => {
      let rebuilt = handle.rebuild().await;
      *entry = EntryBuildState::Built(handle);
      rebuilt?
    }
    EntryBuildState::NotBuilt => {
      let options = engine_options(inner, job, dest_file, dest_filename).await?;
      let result = inner.collaborators.engine.build(options).await?;
      if let Some(handle) = result.rebuild {
        *entry = EntryBuildState::Built(handle);
      }
      result.output_files
    }
  };

  let mut artifact = split_outputs(output_files, &entry_point, dest_filename)?;
  if job.options.minify {
    artifact = minify(inner, artifact, dest_filename).await?;
    let source_root = inner.options.source_root_for(&job.options);
    artifact.map = massage(
      &artifact.map,
      &MassageOptions { source_root: &source_root, full_sourcemaps: inner.options.full_sourcemaps },
    )?;
  }

  write_output_pair(dest_file, &artifact).await?;
  finish_bundle(inner, &job.dest_dir, dest_filename, &job.options, start).await
}

/// Bundles one entry point with the engine and writes `<dest>` and `<dest>.map`.
pub(crate) async fn bundle(inner: &PipelineInner, job: &CompileJob) -> anyhow::Result<()> {
  let start = Instant::now();
  let dest_filename = dest_filename(
    &job.src_filename,
    job.options.minify,
    job.options.minified_name.as_deref(),
    job.options.to_name.as_deref(),
    inner.options.esm,
  );
  let dest_file: PathBuf = job.dest_dir.join(&dest_filename);

  match build(inner, job, &dest_file, &dest_filename, start).await {
    Ok(()) => Ok(()),
    Err(err) => handle_bundle_error(&err, job.options.continues_on_error(), &dest_filename),
  }
}
