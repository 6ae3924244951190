use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::BuildTarget;

/// Read-only lookup from target name to its configuration, in declaration order.
#[derive(Debug, Default, Clone)]
pub struct TargetRegistry {
  targets: IndexMap<ArcStr, BuildTarget>,
}

impl TargetRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, name: &str) -> Option<&BuildTarget> {
    self.targets.get(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &ArcStr> {
    self.targets.keys()
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }
}

impl<N: Into<ArcStr>> FromIterator<(N, BuildTarget)> for TargetRegistry {
  fn from_iter<T: IntoIterator<Item = (N, BuildTarget)>>(iter: T) -> Self {
    Self { targets: iter.into_iter().map(|(name, target)| (name.into(), target)).collect() }
  }
}
