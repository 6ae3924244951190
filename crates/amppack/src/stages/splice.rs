use std::path::Path;

use amppack_common::{BundleOptions, CompiledArtifact, CONTENTS_PLACEHOLDER};
use amppack_error::PipelineError;
use amppack_sourcemap::{
  compose, lines_count, SnippetSource, SourceJoiner, SourceMapDocument, SourceOrigin,
};
use amppack_utils::path_ext::PathExt;
use anyhow::Context;

use crate::{
  pipeline::PipelineInner,
  utils::output::{map_path_of, write_output_pair},
};

/// Statement separator written after every spliced file.
const MODULE_SEPARATOR: &str = ";";

/// Byte offset just past the `{` that opens the wrapper body in `wrapped_text`.
///
/// The wrapper may have been minified after wrapping, so the brace is searched
/// backwards from where the contents placeholder sits in `wrapper_template`. The
/// template must contain a `{` before its placeholder.
pub fn find_insertion_point(wrapped_text: &str, wrapper_template: &str) -> Result<usize, String> {
  let placeholder = wrapper_template
    .find(CONTENTS_PLACEHOLDER)
    .ok_or_else(|| format!("the wrapper has no {CONTENTS_PLACEHOLDER} placeholder"))?;
  let end = (placeholder + 1).min(wrapped_text.len());
  memchr::memrchr(b'{', &wrapped_text.as_bytes()[..end])
    .map(|brace| brace + 1)
    .ok_or_else(|| "no `{` precedes the contents placeholder".to_string())
}

/// Line and UTF-16 column right after `text`.
#[allow(clippy::cast_possible_truncation)]
fn end_position(text: &str) -> (u32, u32) {
  let line_start = memchr::memrchr(b'\n', text.as_bytes()).map_or(0, |idx| idx + 1);
  let col = text[line_start..].chars().map(char::len_utf16).sum::<usize>();
  (lines_count(text), col as u32)
}

/// Moves the pre-built files of `src_filename` inside the wrapper of the already
/// written `dest_file`, right after the `{` opening the wrapper body, and rewrites
/// `<dest_file>.map` to cover the result.
pub(crate) async fn combine_with_compiled_file(
  inner: &PipelineInner,
  src_filename: &str,
  dest_file: &Path,
  options: &BundleOptions,
) -> anyhow::Result<()> {
  let Some(files) = inner.options.auxiliary_bundle(src_filename) else {
    return Ok(());
  };

  let dest_filename = dest_file.file_name_lossy().into_owned();
  let map_file = map_path_of(dest_file);
  let contents = tokio::fs::read_to_string(dest_file)
    .await
    .with_context(|| format!("Failed to read {}", dest_file.display()))?;
  let mut original_map = SourceMapDocument::from_json(
    &tokio::fs::read_to_string(&map_file)
      .await
      .with_context(|| format!("Failed to read {}", map_file.display()))?,
  )?;
  let source_root = original_map.source_root.take();
  let original_map = original_map.to_json_string()?;

  let index = find_insertion_point(&contents, &options.wrapper)
    .map_err(|reason| PipelineError::SpliceLayout { dest_file: dest_file.to_path_buf(), reason })?;
  let (wrapper_open, remaining) = contents.split_at(index);

  let mut auxiliary = Vec::with_capacity(files.len());
  for file in files {
    let path = inner.options.cwd.join(file);
    let text = tokio::fs::read_to_string(&path)
      .await
      .with_context(|| format!("Failed to read {}", path.display()))?;
    auxiliary.push((file.to_string_lossy().into_owned(), text));
  }

  let origin = |line, col| SourceOrigin { source: dest_filename.clone(), content: None, line, col };
  let mut joiner = SourceJoiner::default();
  joiner.append_source(SnippetSource::new(wrapper_open.to_string(), origin(0, 0)));
  for (source, text) in auxiliary {
    let origin = SourceOrigin { source, content: Some(text.clone()), line: 0, col: 0 };
    joiner.append_source_with_separator(SnippetSource::new(text, origin), "");
    joiner.append_source(MODULE_SEPARATOR);
  }
  let (line, col) = end_position(wrapper_open);
  joiner.append_source(SnippetSource::new(remaining.to_string(), origin(line, col)));

  let (code, bundled_map) = joiner.join_with_map(Some(&dest_filename))?;
  let mut remapped = compose(
    &bundled_map.to_json_string()?,
    |source| (source == dest_filename).then(|| original_map.clone()),
    !inner.options.full_sourcemaps,
  )?;
  remapped.source_root = source_root;

  write_output_pair(dest_file, &CompiledArtifact::new(code, remapped.to_json_string()?)).await
}
