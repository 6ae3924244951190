use amppack_ecmascript::{EcmaCompiler, MinifyOptions, PropertyCache, VariableCache};
use async_trait::async_trait;

pub struct CompressRequest<'a> {
  pub code: &'a str,
  /// Map of `code`, empty when there is none.
  pub source_map: &'a str,
  pub filename: &'a str,
  pub options: &'a MinifyOptions,
  pub props: &'a PropertyCache,
  pub vars: &'a mut VariableCache,
}

#[derive(Debug, Default)]
pub struct CompressOutput {
  pub code: Option<String>,
  pub map: Option<String>,
}

#[async_trait]
pub trait Compressor: Send + Sync {
  async fn compress(&self, request: CompressRequest<'_>) -> anyhow::Result<CompressOutput>;
}

/// Compresses with the oxc minifier. The returned map points at the sources of
/// the input map.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcCompressor;

#[async_trait]
impl Compressor for OxcCompressor {
  async fn compress(&self, request: CompressRequest<'_>) -> anyhow::Result<CompressOutput> {
    let printed = EcmaCompiler::minify(
      request.code,
      request.filename,
      request.options,
      request.props,
      request.vars,
    )?;

    let map = match printed.map {
      Some(map) if !request.source_map.is_empty() => {
        let composed = amppack_sourcemap::compose(
          &map,
          |source| (source == request.filename).then(|| request.source_map.to_string()),
          false,
        )?;
        Some(composed.to_json_string()?)
      }
      map => map,
    };

    Ok(CompressOutput { code: Some(printed.code), map })
  }
}
