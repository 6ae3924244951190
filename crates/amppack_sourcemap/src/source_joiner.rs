use std::borrow::Cow;

use crate::{
  decoded_map::{MapBuilder, Segment},
  source::Source,
  SourceMapDocument,
};

struct Entry<'source> {
  source: Box<dyn Source + Send + 'source>,
  separator: Cow<'source, str>,
}

/// Concatenates sources, `\n` between each pair unless a source asks for its own
/// separator.
#[derive(Default)]
pub struct SourceJoiner<'source> {
  inner: Vec<Entry<'source>>,
}

#[derive(Default, Clone, Copy)]
struct Cursor {
  line: u32,
  col: u32,
}

impl Cursor {
  fn advance(&mut self, text: &str) {
    match memchr::memrchr(b'\n', text.as_bytes()) {
      Some(idx) => {
        self.line += crate::lines_count(text);
        self.col = utf16_len(&text[idx + 1..]);
      }
      None => self.col += utf16_len(text),
    }
  }
}

#[allow(clippy::cast_possible_truncation)]
fn utf16_len(text: &str) -> u32 {
  text.chars().map(char::len_utf16).sum::<usize>() as u32
}

impl<'source> SourceJoiner<'source> {
  pub fn append_source<T: Source + Send + 'source>(&mut self, source: T) {
    self.append_source_with_separator(source, "\n");
  }

  /// `separator` is written after `source` when another source follows.
  pub fn append_source_with_separator<T: Source + Send + 'source>(
    &mut self,
    source: T,
    separator: impl Into<Cow<'source, str>>,
  ) {
    self.inner.push(Entry { source: Box::new(source), separator: separator.into() });
  }

  fn pieces(&self) -> impl Iterator<Item = (&dyn Source, Option<&str>)> {
    let last = self.inner.len().saturating_sub(1);
    self.inner.iter().enumerate().map(move |(idx, entry)| {
      (entry.source.as_ref() as &dyn Source, (idx < last).then_some(entry.separator.as_ref()))
    })
  }

  pub fn join(&self) -> String {
    let size_hint = self
      .pieces()
      .map(|(source, separator)| source.content().len() + separator.map_or(0, str::len))
      .sum::<usize>();
    let mut ret = String::with_capacity(size_hint);

    for (source, separator) in self.pieces() {
      ret.push_str(source.content());
      if let Some(separator) = separator {
        ret.push_str(separator);
      }
    }

    ret
  }

  /// Joins the sources and maps every character of sources with an origin back to
  /// that origin. Other text stays unmapped.
  pub fn join_with_map(&self, file: Option<&str>) -> anyhow::Result<(String, SourceMapDocument)> {
    let mut builder = MapBuilder::default();
    let mut cursor = Cursor::default();

    for (source, separator) in self.pieces() {
      match source.origin() {
        Some(origin) => {
          let source_id = builder.source_id(&origin.source, origin.content.as_deref());
          let mut original = Cursor { line: origin.line, col: origin.col };
          for ch in source.content().chars() {
            if ch == '\n' {
              cursor = Cursor { line: cursor.line + 1, col: 0 };
              original = Cursor { line: original.line + 1, col: 0 };
              continue;
            }
            builder.add_segment(Segment {
              dst_line: cursor.line,
              dst_col: cursor.col,
              src_line: original.line,
              src_col: original.col,
              source_id: Some(source_id),
              name_id: None,
            });
            let width = utf16_len(ch.encode_utf8(&mut [0; 4]));
            cursor.col += width;
            original.col += width;
          }
        }
        None => cursor.advance(source.content()),
      }
      if let Some(separator) = separator {
        cursor.advance(separator);
      }
    }

    let document = builder.into_document(file.map(ToString::to_string), false)?;
    Ok((self.join(), document))
  }
}
