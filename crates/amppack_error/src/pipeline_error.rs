use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
  #[error("Could not find target {name}")]
  TargetNotFound { name: String },

  #[error("Could not compile {dest_filename}")]
  BundleFailed { dest_filename: String, message: String },

  #[error("Could not discover the dependencies of {}: {message}", entry_point.display())]
  DependencyDiscoveryFailed { entry_point: PathBuf, message: String },

  /// The wrapped output has no `{` before the position of the contents placeholder.
  #[error("Could not locate the wrapper body in {}: {reason}", dest_file.display())]
  SpliceLayout { dest_file: PathBuf, reason: String },

  #[error("The bundler engine produced no {kind} output for {}", entry_point.display())]
  MissingOutput { entry_point: PathBuf, kind: &'static str },

  #[error("{dest_filename} requires the legacy optimizer, but none was configured")]
  MissingLegacyOptimizer { dest_filename: String },
}

impl PipelineError {
  /// The file name a fatal build failure is reported against, if any.
  pub fn dest_filename(&self) -> Option<&str> {
    match self {
      Self::BundleFailed { dest_filename, .. }
      | Self::MissingLegacyOptimizer { dest_filename } => Some(dest_filename),
      _ => None,
    }
  }
}
