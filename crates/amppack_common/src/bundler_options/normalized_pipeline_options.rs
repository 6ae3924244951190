use std::{path::PathBuf, time::Duration};

use indexmap::IndexMap;

use crate::{BundleOptions, WatchBuildHook};

pub const DEFAULT_WATCH_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const DEFAULT_COMPRESS_PASSES: u32 = 3;
pub const DEFAULT_PRIVATE_PROPERTY_PATTERN: &str = "_AMP_PRIVATE_$";
pub const DEFAULT_CONFIG_GLOBAL: &str = "AMP_CONFIG";

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone)]
pub struct NormalizedPipelineOptions {
  pub cwd: PathBuf,
  pub esm: bool,
  pub full_sourcemaps: bool,
  pub pretty_print: bool,
  pub source_root: String,
  pub use_legacy_optimizer: bool,
  pub watch_debounce: Duration,
  pub compress_passes: u32,
  pub private_property_pattern: String,
  /// Source filename -> pre-built files that execute inside its wrapper.
  pub auxiliary_bundles: IndexMap<String, Vec<PathBuf>>,
  pub defines: IndexMap<String, String>,
  /// Absolute path of the runtime config file, if any.
  pub config: Option<PathBuf>,
  pub config_global: String,
  pub on_watch_build: Option<WatchBuildHook>,
}

impl NormalizedPipelineOptions {
  pub fn source_root_for(&self, options: &BundleOptions) -> String {
    options.sourcemap_url.clone().unwrap_or_else(|| self.source_root.clone())
  }

  pub fn auxiliary_bundle(&self, src_filename: &str) -> Option<&[PathBuf]> {
    self.auxiliary_bundles.get(src_filename).map(Vec::as_slice).filter(|files| !files.is_empty())
  }
}

impl std::fmt::Debug for NormalizedPipelineOptions {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NormalizedPipelineOptions")
      .field("cwd", &self.cwd)
      .field("esm", &self.esm)
      .field("full_sourcemaps", &self.full_sourcemaps)
      .field("use_legacy_optimizer", &self.use_legacy_optimizer)
      .field("watch_debounce", &self.watch_debounce)
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}
