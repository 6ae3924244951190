use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::{BuildTarget, PipelineOptions, TargetRegistry};

/// On-disk project file: the target registry plus the pipeline-wide options.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
  #[serde(default)]
  pub targets: IndexMap<String, BuildTarget>,
  #[serde(flatten)]
  pub pipeline: PipelineOptions,
}

impl ProjectConfig {
  pub fn from_json_str(source: &str) -> anyhow::Result<Self> {
    Ok(serde_json::from_str(source)?)
  }

  /// Relative paths in the file are resolved against the file's directory unless
  /// the file sets `cwd` itself.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let source = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read project file {}", path.display()))?;
    let mut config = Self::from_json_str(&source)
      .with_context(|| format!("Failed to parse project file {}", path.display()))?;
    if config.pipeline.cwd.is_none() {
      config.pipeline.cwd = path.parent().map(Path::to_path_buf);
    }
    Ok(config)
  }

  pub fn into_parts(self) -> (TargetRegistry, PipelineOptions) {
    (self.targets.into_iter().collect(), self.pipeline)
  }
}

#[test]
fn parses_targets_and_pipeline_options() {
  let config = ProjectConfig::from_json_str(
    r#"{
      "esm": true,
      "compressPasses": 2,
      "config": "build-system/global-configs/canary-config.json",
      "defines": { "IS_SXG": "false" },
      "auxiliaryBundles": { "amp-inputmask.js": ["third_party/inputmask/bundle.js"] },
      "targets": {
        "amp.js": {
          "srcDir": "src",
          "srcFilename": "amp.js",
          "destDir": "dist",
          "minifiedDestDir": "dist/v0",
          "options": { "minifiedName": "v0.js", "aliasName": "amp.js" }
        }
      }
    }"#,
  )
  .unwrap();

  assert_eq!(config.pipeline.esm, Some(true));
  assert_eq!(config.pipeline.compress_passes, Some(2));
  assert!(config.pipeline.config.is_some());
  assert!(config.pipeline.config_global.is_none());
  let defines = config.pipeline.defines.as_ref().unwrap();
  assert_eq!(defines.get("IS_SXG").map(String::as_str), Some("false"));

  let (registry, _) = config.into_parts();
  let target = registry.get("amp.js").unwrap();
  assert_eq!(target.entry_point(), Path::new("src").join("amp.js"));
  assert_eq!(target.dest_dir_for(true), Path::new("dist/v0"));
  assert_eq!(target.options.minified_name.as_deref(), Some("v0.js"));
  assert!(registry.get("missing.js").is_none());
}
