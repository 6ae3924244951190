use std::path::Path;

use crate::SourceMapDocument;

#[derive(Debug, Clone, Copy)]
pub struct MassageOptions<'a> {
  pub source_root: &'a str,
  pub full_sourcemaps: bool,
}

/// Prepares a final map for publishing: sources lose one leading `../`, `sourceRoot`
/// is set, `file` is reduced to its base name and `sourcesContent` is dropped unless
/// full sourcemaps were requested.
pub fn massage_document(document: &mut SourceMapDocument, options: &MassageOptions<'_>) {
  for source in &mut document.sources {
    if let Some(stripped) = source.strip_prefix("../") {
      *source = stripped.to_string();
    }
  }
  document.source_root = Some(options.source_root.to_string());
  if let Some(file) = &mut document.file {
    if let Some(base_name) = Path::new(file.as_str()).file_name() {
      *file = base_name.to_string_lossy().into_owned();
    }
  }
  if !options.full_sourcemaps {
    document.sources_content = None;
  }
}

pub fn massage(map_json: &str, options: &MassageOptions<'_>) -> anyhow::Result<String> {
  let mut document = SourceMapDocument::from_json(map_json)?;
  massage_document(&mut document, options);
  document.to_json_string()
}
