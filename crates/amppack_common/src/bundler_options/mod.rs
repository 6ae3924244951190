pub mod bundle_options;
pub mod es_target;
pub mod normalized_pipeline_options;
pub mod output_format;
pub mod target_options;

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::WatchBuildHook;

/// Process-wide build flags as read from the project file or the command line.
#[derive(Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
  pub cwd: Option<PathBuf>,
  pub esm: Option<bool>,
  pub full_sourcemaps: Option<bool>,
  pub pretty_print: Option<bool>,
  pub source_root: Option<String>,
  pub use_legacy_optimizer: Option<bool>,
  pub watch_debounce_ms: Option<u64>,
  pub compress_passes: Option<u32>,
  pub private_property_pattern: Option<String>,
  pub auxiliary_bundles: Option<IndexMap<String, Vec<PathBuf>>>,
  /// Identifier -> replacement expression, applied to every bundle.
  pub defines: Option<IndexMap<String, String>>,
  /// JSON file whose contents are assigned to `config_global` ahead of each
  /// non-npm bundle.
  pub config: Option<PathBuf>,
  pub config_global: Option<String>,

  #[serde(skip)]
  pub on_watch_build: Option<WatchBuildHook>,
}
