mod compressor;
mod engine;
mod pipeline;
mod plugins;
mod prelude;
mod stages;
mod state;
mod utils;
mod watch;

#[cfg(test)]
mod test_utils;

pub use crate::{
  compressor::{CompressOutput, CompressRequest, Compressor, OxcCompressor},
  engine::{
    BundlerEngine, DependencyScan, EngineBuildOptions, EngineBuildResult, EsbuildEngine,
    OutputFile, RebuildHandle,
  },
  pipeline::{Collaborators, FanOut, Pipeline},
  plugins::{
    BundlerPlugin, DownlevelPlugin, RemapDependenciesPlugin, ResolvedRedirect, TransformOutput,
  },
  prelude::{ConfigPrelude, JsonConfigPrelude, NoPrelude},
  stages::{
    legacy::{ClosureCompiler, LegacyOptimizer, LegacyRequest},
    splice::find_insertion_point,
  },
  state::{BuildState, EntryBuildState, NameCache},
  utils::bundle_error::strip_stack_frames,
  watch::{FileWatcher, NotifyWatcher, WatchGuard},
};
pub use amppack_common::*;
pub use amppack_error::{BuildError, BuildResult, PipelineError};
