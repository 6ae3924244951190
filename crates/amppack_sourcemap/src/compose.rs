use crate::{
  decoded_map::{DecodedMap, MapBuilder, Segment},
  SourceMapDocument,
};

enum TraceNode {
  Original { source: String, content: Option<String> },
  Map { map: DecodedMap, children: Vec<TraceNode> },
}

struct Traced<'a> {
  source: &'a str,
  content: Option<&'a str>,
  line: u32,
  col: u32,
  name: Option<&'a str>,
}

impl TraceNode {
  fn build(
    source: &str,
    content: Option<&str>,
    resolver: &mut dyn FnMut(&str) -> Option<String>,
    stack: &mut Vec<String>,
  ) -> anyhow::Result<Self> {
    // A map that (indirectly) points back at itself ends the trace.
    if stack.iter().any(|visited| visited == source) {
      return Ok(Self::original(source, content));
    }
    let Some(raw) = resolver(source) else {
      return Ok(Self::original(source, content));
    };

    let map = DecodedMap::from_json(&raw)?;
    stack.push(source.to_string());
    let children = map
      .document
      .sources
      .iter()
      .enumerate()
      .map(|(idx, child)| Self::build(child, map.document.source_content(idx), resolver, stack))
      .collect::<anyhow::Result<Vec<_>>>();
    stack.pop();

    Ok(Self::Map { children: children?, map })
  }

  fn original(source: &str, content: Option<&str>) -> Self {
    Self::Original { source: source.to_string(), content: content.map(ToString::to_string) }
  }

  fn trace<'a>(&'a self, line: u32, col: u32, name: Option<&'a str>) -> Option<Traced<'a>> {
    match self {
      Self::Original { source, content } => {
        Some(Traced { source, content: content.as_deref(), line, col, name })
      }
      Self::Map { map, children } => {
        let segment = map.lookup(line, col)?;
        let child = children.get(segment.source_id? as usize)?;
        let name = segment.name_id.and_then(|id| map.name(id)).or(name);
        child.trace(segment.src_line, segment.src_col, name)
      }
    }
  }
}

/// Rewrites `raw_map` so that it points at original sources.
///
/// Every source of `raw_map` is passed to `resolver`. A returned map is traced
/// through (its own sources are resolved the same way), `None` marks the source as
/// an original. Mappings that cannot be traced are dropped. The result never carries
/// a `sourceRoot`.
pub fn compose<F>(
  raw_map: &str,
  mut resolver: F,
  exclude_content: bool,
) -> anyhow::Result<SourceMapDocument>
where
  F: FnMut(&str) -> Option<String>,
{
  let root = DecodedMap::from_json(raw_map)?;
  let mut stack = Vec::new();
  let children = root
    .document
    .sources
    .iter()
    .enumerate()
    .map(|(idx, source)| {
      TraceNode::build(source, root.document.source_content(idx), &mut resolver, &mut stack)
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

  let mut builder = MapBuilder::default();
  for segment in root.segments() {
    let Some(child) = segment.source_id.and_then(|id| children.get(id as usize)) else {
      continue;
    };
    let name = segment.name_id.and_then(|id| root.name(id));
    let Some(traced) = child.trace(segment.src_line, segment.src_col, name) else {
      continue;
    };

    let source_id = builder.source_id(traced.source, traced.content);
    let name_id = traced.name.map(|name| builder.name_id(name));
    builder.add_segment(Segment {
      dst_line: segment.dst_line,
      dst_col: segment.dst_col,
      src_line: traced.line,
      src_col: traced.col,
      source_id: Some(source_id),
      name_id,
    });
  }

  builder.into_document(root.document.file.clone(), exclude_content)
}

/// Composes the maps of consecutive stages, first stage first. Each stage has a
/// single input which is the output of the stage before it.
///
/// Only that input, named by the stage map itself, resolves to the earlier maps.
/// Sources reached while tracing through them stay originals, even when their
/// names look alike.
pub fn compose_chain<I, S>(maps: I, exclude_content: bool) -> anyhow::Result<SourceMapDocument>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut maps = maps.into_iter();
  let Some(first) = maps.next() else {
    return Ok(SourceMapDocument::default());
  };
  let mut composed = compose(first.as_ref(), |_| None, exclude_content)?;

  for map in maps {
    let next = SourceMapDocument::from_json(map.as_ref())?;
    let input = match next.sources.as_slice() {
      [only] => Some(only.clone()),
      sources => composed.file.clone().filter(|file| sources.contains(file)),
    };
    // Taken on first use: the top-level input is resolved before anything nested.
    let mut previous = Some(composed.to_json_string()?);
    composed = compose(
      map.as_ref(),
      |source| {
        if input.as_deref() == Some(source) {
          previous.take()
        } else {
          None
        }
      },
      exclude_content,
    )?;
  }

  Ok(composed)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn map_of(
    file: &str,
    source: &str,
    content: Option<&str>,
    segments: &[(u32, u32, u32, u32, Option<&str>)],
  ) -> String {
    let mut builder = MapBuilder::default();
    let source_id = builder.source_id(source, content);
    for &(dst_line, dst_col, src_line, src_col, name) in segments {
      let name_id = name.map(|name| builder.name_id(name));
      builder.add_segment(Segment {
        dst_line,
        dst_col,
        src_line,
        src_col,
        source_id: Some(source_id),
        name_id,
      });
    }
    builder.into_document(Some(file.to_string()), false).unwrap().to_json_string().unwrap()
  }

  #[test]
  fn pass_through_keeps_mappings() {
    let raw = map_of("out.js", "in.js", Some("let a = 1;"), &[(0, 0, 0, 0, None), (0, 4, 0, 4, Some("a"))]);
    let composed = compose(&raw, |_| None, false).unwrap();

    assert_eq!(composed.sources, vec!["in.js".to_string()]);
    assert_eq!(composed.names, vec!["a".to_string()]);
    assert_eq!(composed.source_content(0), Some("let a = 1;"));
    assert_eq!(composed.mappings, SourceMapDocument::from_json(&raw).unwrap().mappings);
    assert!(composed.source_root.is_none());
  }

  #[test]
  fn traces_through_resolved_maps() {
    let bundle = map_of("bundle.js", "src/a.js", Some("// a"), &[(0, 0, 2, 4, Some("foo"))]);
    let minified = map_of("min.js", "bundle.js", None, &[(0, 10, 0, 0, None), (0, 20, 5, 0, None)]);

    let composed = compose(
      &minified,
      |source| (source == "bundle.js").then(|| bundle.clone()),
      true,
    )
    .unwrap();

    assert_eq!(composed.file.as_deref(), Some("min.js"));
    assert_eq!(composed.sources, vec!["src/a.js".to_string()]);
    assert!(composed.sources_content.is_none());

    let decoded = DecodedMap::new(composed).unwrap();
    let segments = decoded.segments().collect::<Vec<_>>();
    // The second mapping points at a line the bundle map does not cover.
    assert_eq!(segments.len(), 1);
    assert_eq!((segments[0].dst_col, segments[0].src_line, segments[0].src_col), (10, 2, 4));
    assert_eq!(segments[0].name_id.and_then(|id| decoded.name(id)), Some("foo"));
  }

  #[test]
  fn self_referencing_maps_terminate() {
    let looped = map_of("a.js", "a.js", None, &[(0, 0, 0, 0, None)]);
    let composed = compose(&looped, |_| Some(looped.clone()), false).unwrap();
    assert_eq!(composed.sources, vec!["a.js".to_string()]);
  }

  #[test]
  fn chains_stage_maps_in_order() {
    let first = map_of("step1.js", "entry.js", Some("entry"), &[(0, 0, 3, 0, None)]);
    let second = map_of("step2.js", "step1.js", None, &[(1, 2, 0, 0, None)]);
    let third = map_of("step3.js", "step2.js", None, &[(0, 0, 1, 2, None)]);

    let composed = compose_chain([first, second, third], false).unwrap();
    assert_eq!(composed.file.as_deref(), Some("step3.js"));
    assert_eq!(composed.sources, vec!["entry.js".to_string()]);

    let decoded = DecodedMap::new(composed).unwrap();
    let segment = decoded.lookup(0, 0).unwrap();
    assert_eq!((segment.src_line, segment.src_col), (3, 0));
  }

  #[test]
  fn chained_input_resolves_only_at_the_top_level() {
    // The bundle has two inputs, one sharing its basename with the bundle itself.
    let mut builder = MapBuilder::default();
    let dep = builder.source_id("../src/dep.js", None);
    let entry = builder.source_id("../src/amp-a.js", None);
    for (dst_line, src_line, source_id) in [(2, 9, dep), (5, 2, entry)] {
      builder.add_segment(Segment {
        dst_line,
        dst_col: 0,
        src_line,
        src_col: 0,
        source_id: Some(source_id),
        name_id: None,
      });
    }
    let bundle = builder
      .into_document(Some("amp-a.js".to_string()), false)
      .unwrap()
      .to_json_string()
      .unwrap();
    let downlevel =
      map_of("amp-a.js", "/proj/dist/amp-a.js", None, &[(2, 0, 2, 0, None), (5, 0, 5, 0, None)]);

    let composed = compose_chain([bundle, downlevel], false).unwrap();
    let decoded = DecodedMap::new(composed).unwrap();

    let segment = decoded.lookup(5, 0).unwrap();
    let source = &decoded.document.sources[segment.source_id.unwrap() as usize];
    assert_eq!((source.as_str(), segment.src_line, segment.src_col), ("../src/amp-a.js", 2, 0));

    let segment = decoded.lookup(2, 0).unwrap();
    let source = &decoded.document.sources[segment.source_id.unwrap() as usize];
    assert_eq!((source.as_str(), segment.src_line), ("../src/dep.js", 9));
  }
}
