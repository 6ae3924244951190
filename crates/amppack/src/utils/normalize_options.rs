use std::{path::PathBuf, time::Duration};

use amppack_common::{
  NormalizedPipelineOptions, PipelineOptions, DEFAULT_COMPRESS_PASSES, DEFAULT_CONFIG_GLOBAL,
  DEFAULT_PRIVATE_PROPERTY_PATTERN, DEFAULT_WATCH_DEBOUNCE,
};
use sugar_path::SugarPath;

pub fn normalize_options(raw_options: PipelineOptions) -> NormalizedPipelineOptions {
  let cwd = raw_options.cwd.unwrap_or_else(|| PathBuf::from(".")).absolutize();

  let config = raw_options.config.map(|config| cwd.join(config));

  NormalizedPipelineOptions {
    cwd,
    esm: raw_options.esm.unwrap_or(false),
    full_sourcemaps: raw_options.full_sourcemaps.unwrap_or(false),
    pretty_print: raw_options.pretty_print.unwrap_or(false),
    source_root: raw_options.source_root.unwrap_or_else(|| "/".to_string()),
    use_legacy_optimizer: raw_options.use_legacy_optimizer.unwrap_or(false),
    watch_debounce: raw_options
      .watch_debounce_ms
      .map_or(DEFAULT_WATCH_DEBOUNCE, Duration::from_millis),
    compress_passes: raw_options.compress_passes.unwrap_or(DEFAULT_COMPRESS_PASSES),
    private_property_pattern: raw_options
      .private_property_pattern
      .unwrap_or_else(|| DEFAULT_PRIVATE_PROPERTY_PATTERN.to_string()),
    auxiliary_bundles: raw_options.auxiliary_bundles.unwrap_or_default(),
    defines: raw_options.defines.unwrap_or_default(),
    config,
    config_global: raw_options.config_global.unwrap_or_else(|| DEFAULT_CONFIG_GLOBAL.to_string()),
    on_watch_build: raw_options.on_watch_build,
  }
}

#[test]
fn fills_in_defaults() {
  let options = normalize_options(PipelineOptions {
    cwd: Some(PathBuf::from("/repo")),
    watch_debounce_ms: Some(50),
    config: Some(PathBuf::from("build-system/global-configs/prod-config.json")),
    ..PipelineOptions::default()
  });

  assert_eq!(options.cwd, PathBuf::from("/repo"));
  assert_eq!(options.watch_debounce, Duration::from_millis(50));
  assert_eq!(options.compress_passes, 3);
  assert_eq!(options.private_property_pattern, "_AMP_PRIVATE_$");
  assert!(!options.esm);
  assert!(options.auxiliary_bundle("amp-inputmask.js").is_none());
  assert!(options.defines.is_empty());
  assert_eq!(
    options.config,
    Some(PathBuf::from("/repo/build-system/global-configs/prod-config.json"))
  );
  assert_eq!(options.config_global, "AMP_CONFIG");
}
