use crate::lines_count;

pub trait Source {
  fn content(&self) -> &str;

  fn lines_count(&self) -> u32 {
    lines_count(self.content())
  }

  /// Where this text was taken from, when it should be mapped back there.
  fn origin(&self) -> Option<&SourceOrigin> {
    None
  }
}

impl Source for &str {
  fn content(&self) -> &str {
    self
  }
}

impl Source for String {
  fn content(&self) -> &str {
    self
  }
}

/// Position of a snippet inside the file it was cut from. Columns are UTF-16 based.
#[derive(Debug, Clone)]
pub struct SourceOrigin {
  pub source: String,
  pub content: Option<String>,
  pub line: u32,
  pub col: u32,
}

/// Text cut out of another file that keeps pointing at its original position.
#[derive(Debug)]
pub struct SnippetSource {
  content: String,
  origin: SourceOrigin,
}

impl SnippetSource {
  pub fn new(content: String, origin: SourceOrigin) -> Self {
    Self { content, origin }
  }
}

impl Source for SnippetSource {
  fn content(&self) -> &str {
    &self.content
  }

  fn origin(&self) -> Option<&SourceOrigin> {
    Some(&self.origin)
  }
}
