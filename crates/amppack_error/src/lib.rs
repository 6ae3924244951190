mod pipeline_error;

use std::ops::{Deref, DerefMut};

pub use crate::pipeline_error::PipelineError;

/// Aggregate of every failure surfaced by one build call. Fan-out builds collect
/// the failures of each target here instead of stopping at the first one.
#[derive(Debug)]
pub struct BuildError(pub Vec<anyhow::Error>);

impl BuildError {
  /// Failures that carry a [`PipelineError`], in the order they were collected.
  pub fn pipeline_errors(&self) -> impl Iterator<Item = &PipelineError> {
    self.0.iter().filter_map(|error| error.downcast_ref::<PipelineError>())
  }

  /// Output files that could not be produced, deduplicated.
  pub fn failed_outputs(&self) -> Vec<&str> {
    let mut outputs = Vec::new();
    for name in self.pipeline_errors().filter_map(PipelineError::dest_filename) {
      if !outputs.contains(&name) {
        outputs.push(name);
      }
    }
    outputs
  }
}

impl Deref for BuildError {
  type Target = Vec<anyhow::Error>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![error])
  }
}

impl From<PipelineError> for BuildError {
  fn from(error: PipelineError) -> Self {
    Self(vec![error.into()])
  }
}

impl From<Vec<anyhow::Error>> for BuildError {
  fn from(errors: Vec<anyhow::Error>) -> Self {
    Self(errors)
  }
}

impl std::fmt::Display for BuildError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (idx, error) in self.0.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      write!(f, "{error:#}")?;
    }
    Ok(())
  }
}

pub type BuildResult<T> = anyhow::Result<T, BuildError>;

#[test]
fn pipeline_errors_are_found_in_aggregate() {
  let error = BuildError(vec![
    anyhow::anyhow!("unrelated"),
    PipelineError::TargetNotFound { name: "amp.js".to_string() }.into(),
  ]);

  let found = error.pipeline_errors().collect::<Vec<_>>();
  assert_eq!(found.len(), 1);
  assert!(matches!(found[0], PipelineError::TargetNotFound { name } if name == "amp.js"));
}

#[test]
fn failed_outputs_name_each_file_once() {
  let bundle_failed = |name: &str| PipelineError::BundleFailed {
    dest_filename: name.to_string(),
    message: "Unexpected token".to_string(),
  };
  let error = BuildError(vec![
    bundle_failed("amp-a.js").into(),
    PipelineError::TargetNotFound { name: "amp-x.js".to_string() }.into(),
    PipelineError::MissingLegacyOptimizer { dest_filename: "v0.js".to_string() }.into(),
    bundle_failed("amp-a.js").into(),
  ]);

  assert_eq!(error.failed_outputs(), vec!["amp-a.js", "v0.js"]);
}
