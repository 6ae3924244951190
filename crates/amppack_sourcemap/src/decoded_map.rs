use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use rustc_hash::FxHashMap;

use crate::SourceMapDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
  pub dst_line: u32,
  pub dst_col: u32,
  pub src_line: u32,
  pub src_col: u32,
  pub source_id: Option<u32>,
  pub name_id: Option<u32>,
}

/// A sourcemap document with its mappings decoded and grouped by generated line.
pub(crate) struct DecodedMap {
  pub document: SourceMapDocument,
  lines: Vec<Vec<Segment>>,
}

impl DecodedMap {
  pub fn new(document: SourceMapDocument) -> anyhow::Result<Self> {
    let mut lines: Vec<Vec<Segment>> = Vec::new();

    if !document.mappings.is_empty() {
      // Only the mappings are decoded here, the rest is read from `document`.
      let bare = SourceMapDocument {
        sources_content: None,
        source_root: None,
        extra: serde_json::Map::new(),
        ..document.clone()
      };
      let map = SourceMap::from_json_string(&bare.to_json_string()?)
        .map_err(|err| anyhow::anyhow!("Invalid sourcemap: {err:?}"))?;

      for token in map.get_tokens() {
        let segment = Segment {
          dst_line: token.get_dst_line(),
          dst_col: token.get_dst_col(),
          src_line: token.get_src_line(),
          src_col: token.get_src_col(),
          source_id: token.get_source_id(),
          name_id: token.get_name_id(),
        };
        let line = segment.dst_line as usize;
        if lines.len() <= line {
          lines.resize_with(line + 1, Vec::new);
        }
        lines[line].push(segment);
      }

      for line in &mut lines {
        line.sort_by_key(|segment| segment.dst_col);
      }
    }

    Ok(Self { document, lines })
  }

  pub fn from_json(source: &str) -> anyhow::Result<Self> {
    Self::new(SourceMapDocument::from_json(source)?)
  }

  pub fn segments(&self) -> impl Iterator<Item = &Segment> {
    self.lines.iter().flatten()
  }

  /// The segment covering a generated position: the last one on `line` starting at or
  /// before `col`.
  pub fn lookup(&self, line: u32, col: u32) -> Option<&Segment> {
    let segments = self.lines.get(line as usize)?;
    let idx = segments.partition_point(|segment| segment.dst_col <= col);
    idx.checked_sub(1).map(|idx| &segments[idx])
  }

  pub fn name(&self, id: u32) -> Option<&str> {
    self.document.names.get(id as usize).map(String::as_str)
  }
}

/// Collects sources, names and segments, then encodes them into a document.
#[derive(Default)]
pub(crate) struct MapBuilder {
  sources: Vec<String>,
  sources_content: Vec<Option<String>>,
  source_ids: FxHashMap<String, u32>,
  names: Vec<String>,
  name_ids: FxHashMap<String, u32>,
  segments: Vec<Segment>,
}

#[allow(clippy::cast_possible_truncation)]
impl MapBuilder {
  pub fn source_id(&mut self, source: &str, content: Option<&str>) -> u32 {
    if let Some(&id) = self.source_ids.get(source) {
      let slot = &mut self.sources_content[id as usize];
      if slot.is_none() {
        *slot = content.map(ToString::to_string);
      }
      return id;
    }
    let id = self.sources.len() as u32;
    self.sources.push(source.to_string());
    self.sources_content.push(content.map(ToString::to_string));
    self.source_ids.insert(source.to_string(), id);
    id
  }

  pub fn name_id(&mut self, name: &str) -> u32 {
    if let Some(&id) = self.name_ids.get(name) {
      return id;
    }
    let id = self.names.len() as u32;
    self.names.push(name.to_string());
    self.name_ids.insert(name.to_string(), id);
    id
  }

  pub fn add_segment(&mut self, segment: Segment) {
    self.segments.push(segment);
  }

  pub fn into_document(
    mut self,
    file: Option<String>,
    exclude_content: bool,
  ) -> anyhow::Result<SourceMapDocument> {
    self.segments.sort_by_key(|segment| (segment.dst_line, segment.dst_col));
    self.segments.dedup_by_key(|segment| (segment.dst_line, segment.dst_col));

    let mut builder = SourceMapBuilder::default();
    for source in &self.sources {
      builder.add_source_and_content(source, "");
    }
    for name in &self.names {
      builder.add_name(name);
    }
    for segment in &self.segments {
      builder.add_token(
        segment.dst_line,
        segment.dst_col,
        segment.src_line,
        segment.src_col,
        segment.source_id,
        segment.name_id,
      );
    }
    let encoded = SourceMapDocument::from_json(&builder.into_sourcemap().to_json_string())?;

    let has_content = self.sources_content.iter().any(Option::is_some);
    Ok(SourceMapDocument {
      file,
      sources: self.sources,
      sources_content: (!exclude_content && has_content).then_some(self.sources_content),
      names: self.names,
      mappings: encoded.mappings,
      ..SourceMapDocument::default()
    })
  }
}
