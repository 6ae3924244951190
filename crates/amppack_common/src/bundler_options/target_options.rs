use indexmap::IndexMap;
use serde::Deserialize;

use crate::OutputFormat;

/// Options a target declares in the registry. The same shape carries call-level
/// overrides, so every field is optional and [`TargetOptions::merge`] decides who wins.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetOptions {
  pub wrapper: Option<String>,
  pub minified_name: Option<String>,
  pub alias_name: Option<String>,
  pub to_name: Option<String>,
  /// Display name of npm builds.
  pub name: Option<String>,
  pub output_format: Option<OutputFormat>,
  pub external_dependencies: Option<Vec<String>>,
  pub remap_dependencies: Option<IndexMap<String, String>>,
  pub watch: Option<bool>,
  pub minify: Option<bool>,
  pub npm: Option<bool>,
  pub continue_on_error: Option<bool>,
  pub sourcemap_url: Option<String>,
}

impl TargetOptions {
  /// Field-wise merge where every field set in `overrides` wins.
  pub fn merge(&self, overrides: &TargetOptions) -> TargetOptions {
    TargetOptions {
      wrapper: overrides.wrapper.clone().or_else(|| self.wrapper.clone()),
      minified_name: overrides.minified_name.clone().or_else(|| self.minified_name.clone()),
      alias_name: overrides.alias_name.clone().or_else(|| self.alias_name.clone()),
      to_name: overrides.to_name.clone().or_else(|| self.to_name.clone()),
      name: overrides.name.clone().or_else(|| self.name.clone()),
      output_format: overrides.output_format.or(self.output_format),
      external_dependencies: overrides
        .external_dependencies
        .clone()
        .or_else(|| self.external_dependencies.clone()),
      remap_dependencies: overrides
        .remap_dependencies
        .clone()
        .or_else(|| self.remap_dependencies.clone()),
      watch: overrides.watch.or(self.watch),
      minify: overrides.minify.or(self.minify),
      npm: overrides.npm.or(self.npm),
      continue_on_error: overrides.continue_on_error.or(self.continue_on_error),
      sourcemap_url: overrides.sourcemap_url.clone().or_else(|| self.sourcemap_url.clone()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn call_level_overrides_win() {
    let defaults = TargetOptions {
      minified_name: Some("v0.js".to_string()),
      minify: Some(false),
      external_dependencies: Some(vec!["preact".to_string()]),
      ..Default::default()
    };
    let overrides = TargetOptions { minify: Some(true), watch: Some(true), ..Default::default() };

    let merged = defaults.merge(&overrides);
    assert_eq!(merged.minify, Some(true));
    assert_eq!(merged.watch, Some(true));
    assert_eq!(merged.minified_name.as_deref(), Some("v0.js"));
    assert_eq!(merged.external_dependencies, Some(vec!["preact".to_string()]));
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let result = serde_json::from_str::<TargetOptions>(r#"{ "minifiedName": "v0.js", "mystery": 1 }"#);
    assert!(result.is_err());

    let options =
      serde_json::from_str::<TargetOptions>(r#"{ "minifiedName": "v0.js", "outputFormat": "esm" }"#)
        .unwrap();
    assert_eq!(options.output_format, Some(OutputFormat::Esm));
  }
}
