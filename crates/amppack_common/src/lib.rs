mod bundler_options;
mod types;

pub use bundler_options::{
  bundle_options::{BundleOptions, WatchBuild, WatchBuildHook},
  es_target::ESTarget,
  normalized_pipeline_options::{
    NormalizedPipelineOptions, DEFAULT_COMPRESS_PASSES, DEFAULT_CONFIG_GLOBAL,
    DEFAULT_PRIVATE_PROPERTY_PATTERN, DEFAULT_WATCH_DEBOUNCE,
  },
  output_format::OutputFormat,
  target_options::TargetOptions,
  PipelineOptions,
};

pub use crate::types::{
  build_target::BuildTarget,
  compiled_artifact::CompiledArtifact,
  project_config::ProjectConfig,
  target_registry::TargetRegistry,
  wrapper::{split_wrapper, SplitWrapper, CONTENTS_PLACEHOLDER},
};
