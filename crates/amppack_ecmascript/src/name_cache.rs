use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{mapref::entry::Entry, DashMap};
use rustc_hash::{FxHashMap, FxHashSet};

const LEADING: &[u8; 54] = b"etnrisoufcldhpmabgvyxwqkjzETNRISOUFCLDHPMABGVYXWQKJZ$_";
const TRAILING: &[u8; 64] =
  b"etnrisoufcldhpmabgvyxwqkjzETNRISOUFCLDHPMABGVYXWQKJZ$_0123456789";

const RESERVED_WORDS: &[&str] = &[
  "do", "if", "in", "for", "let", "new", "try", "var", "case", "else", "enum", "eval", "null",
  "this", "true", "void", "with", "break", "catch", "class", "const", "false", "super", "throw",
  "while", "yield", "delete", "export", "import", "public", "return", "static", "switch",
  "typeof", "default", "extends", "finally", "package", "private", "continue", "debugger",
  "function", "arguments", "interface", "protected", "implements", "instanceof", "undefined",
];

/// The `n`th short identifier: `e`, `t`, `n`, ..., `_`, `ee`, `te`, ...
fn base54(n: usize) -> String {
  let mut ret = String::new();
  ret.push(char::from(LEADING[n % LEADING.len()]));
  let mut rest = n / LEADING.len();
  while rest > 0 {
    rest -= 1;
    ret.push(char::from(TRAILING[rest % TRAILING.len()]));
    rest /= TRAILING.len();
  }
  ret
}

/// Property renames shared by every minification of a pipeline, so that a property
/// mangled in one bundle gets the same name in all of them.
#[derive(Debug, Default)]
pub struct PropertyCache {
  names: DashMap<String, String>,
  next_id: AtomicUsize,
}

impl PropertyCache {
  pub fn get(&self, original: &str) -> Option<String> {
    self.names.get(original).map(|name| name.clone())
  }

  /// Returns the cached name of `original`, assigning a fresh one if needed. A fresh
  /// name never collides with `in_use` or with any name handed out before.
  pub fn get_or_assign(&self, original: &str, in_use: &FxHashSet<String>) -> String {
    if let Some(name) = self.names.get(original) {
      return name.clone();
    }
    match self.names.entry(original.to_string()) {
      Entry::Occupied(entry) => entry.get().clone(),
      Entry::Vacant(entry) => loop {
        let candidate = base54(self.next_id.fetch_add(1, Ordering::Relaxed));
        if !in_use.contains(&candidate) && !RESERVED_WORDS.contains(&candidate.as_str()) {
          break entry.insert(candidate).clone();
        }
      },
    }
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

/// Top-level variable renames of a single minification.
#[derive(Debug, Default)]
pub struct VariableCache {
  names: FxHashMap<String, String>,
}

impl VariableCache {
  pub fn insert(&mut self, original: String, mangled: String) {
    self.names.insert(original, mangled);
  }

  pub fn get(&self, original: &str) -> Option<&str> {
    self.names.get(original).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}
