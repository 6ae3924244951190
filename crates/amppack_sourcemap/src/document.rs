use serde::{Deserialize, Serialize};

/// A v3 sourcemap as it is stored on disk.
///
/// Stages exchange maps as JSON text; this is the structured form used to inspect
/// and rewrite them. Unknown fields such as `x_google_ignoreList` are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapDocument {
  pub version: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_root: Option<String>,
  #[serde(default)]
  pub sources: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sources_content: Option<Vec<Option<String>>>,
  #[serde(default)]
  pub names: Vec<String>,
  #[serde(default)]
  pub mappings: String,
  #[serde(flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for SourceMapDocument {
  fn default() -> Self {
    Self {
      version: 3,
      file: None,
      source_root: None,
      sources: Vec::new(),
      sources_content: None,
      names: Vec::new(),
      mappings: String::new(),
      extra: serde_json::Map::new(),
    }
  }
}

impl SourceMapDocument {
  pub fn from_json(source: &str) -> anyhow::Result<Self> {
    Ok(serde_json::from_str(source)?)
  }

  pub fn to_json_string(&self) -> anyhow::Result<String> {
    Ok(serde_json::to_string(self)?)
  }

  pub fn source_content(&self, idx: usize) -> Option<&str> {
    self.sources_content.as_ref()?.get(idx)?.as_deref()
  }
}

#[test]
fn keeps_unknown_fields() {
  let doc = SourceMapDocument::from_json(
    r#"{"version":3,"sources":["a.js"],"mappings":"AAAA","x_google_ignoreList":[0]}"#,
  )
  .unwrap();
  assert_eq!(doc.sources, vec!["a.js".to_string()]);
  assert!(doc.sources_content.is_none());

  let json = doc.to_json_string().unwrap();
  assert!(json.contains("\"x_google_ignoreList\":[0]"));
  assert!(!json.contains("sourceRoot"));
}
