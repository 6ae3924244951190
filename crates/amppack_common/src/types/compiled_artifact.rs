/// Code and its text-encoded sourcemap as handed from one stage to the next.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
  pub code: String,
  pub map: String,
}

impl CompiledArtifact {
  pub fn new(code: impl Into<String>, map: impl Into<String>) -> Self {
    Self { code: code.into(), map: map.into() }
  }
}
