use amppack_common::CompiledArtifact;
use amppack_ecmascript::VariableCache;
use amppack_sourcemap::SourceMapDocument;

use crate::{compressor::CompressRequest, pipeline::PipelineInner};

/// Runs the compressor over a bundled file. Property renames carry over from
/// earlier calls, variable renames never do: each call starts from an empty
/// variable cache and replaces the shared one with what it recorded.
pub(crate) async fn minify(
  inner: &PipelineInner,
  artifact: CompiledArtifact,
  filename: &str,
) -> anyhow::Result<CompiledArtifact> {
  let name_cache = &inner.state.name_cache;
  let mut vars = VariableCache::default();

  let output = inner
    .collaborators
    .compressor
    .compress(CompressRequest {
      code: &artifact.code,
      source_map: &artifact.map,
      filename,
      options: &inner.minify_options,
      props: &name_cache.props,
      vars: &mut vars,
    })
    .await?;
  *name_cache.vars.lock().await = vars;

  let mut document = match output.map {
    Some(map) => SourceMapDocument::from_json(&map)?,
    None => SourceMapDocument::default(),
  };
  document.file = Some(filename.to_string());
  Ok(CompiledArtifact { code: output.code.unwrap_or_default(), map: document.to_json_string()? })
}
