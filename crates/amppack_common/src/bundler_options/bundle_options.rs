use std::{path::Path, sync::Arc};

use amppack_error::BuildResult;
use indexmap::IndexMap;

use crate::{OutputFormat, TargetOptions, CONTENTS_PLACEHOLDER};

/// Reported to [`WatchBuildHook`] after every build of an entry point driven by `compile_js`.
pub struct WatchBuild<'a> {
  pub entry_point: &'a Path,
  pub outcome: &'a BuildResult<()>,
}

pub type WatchBuildHook = Arc<dyn Fn(&WatchBuild<'_>) + Send + Sync>;

/// Fully populated options of one build, produced from merged [`TargetOptions`].
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct BundleOptions {
  pub wrapper: String,
  pub minified_name: Option<String>,
  pub alias_name: Option<String>,
  pub to_name: Option<String>,
  pub name: Option<String>,
  pub output_format: OutputFormat,
  pub external_dependencies: Vec<String>,
  pub remap_dependencies: IndexMap<String, String>,
  pub watch: bool,
  pub minify: bool,
  pub npm: bool,
  pub continue_on_error: bool,
  pub sourcemap_url: Option<String>,
}

impl BundleOptions {
  /// Watch builds never abort the process on a failed compile.
  pub fn continues_on_error(&self) -> bool {
    self.continue_on_error || self.watch
  }
}

impl Default for BundleOptions {
  fn default() -> Self {
    TargetOptions::default().into()
  }
}

impl From<TargetOptions> for BundleOptions {
  fn from(options: TargetOptions) -> Self {
    Self {
      wrapper: options.wrapper.unwrap_or_else(|| CONTENTS_PLACEHOLDER.to_string()),
      minified_name: options.minified_name,
      alias_name: options.alias_name,
      to_name: options.to_name,
      name: options.name,
      output_format: options.output_format.unwrap_or_default(),
      external_dependencies: options.external_dependencies.unwrap_or_default(),
      remap_dependencies: options.remap_dependencies.unwrap_or_default(),
      watch: options.watch.unwrap_or(false),
      minify: options.minify.unwrap_or(false),
      npm: options.npm.unwrap_or(false),
      continue_on_error: options.continue_on_error.unwrap_or(false),
      sourcemap_url: options.sourcemap_url,
    }
  }
}
