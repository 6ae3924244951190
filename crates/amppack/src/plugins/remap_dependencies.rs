use std::sync::Arc;

use amppack_resolver::Resolver;
use amppack_utils::path_ext::PathExt;
use indexmap::IndexMap;

use super::{BundlerPlugin, ResolvedRedirect};

/// Redirects imports listed in a target's remap table. A replacement that is itself
/// an external dependency stays external; any other replacement is resolved from
/// the working directory.
pub struct RemapDependenciesPlugin {
  remap: IndexMap<String, String>,
  external: Vec<String>,
  resolver: Arc<Resolver>,
}

impl RemapDependenciesPlugin {
  pub fn new(
    remap: IndexMap<String, String>,
    external: Vec<String>,
    resolver: Arc<Resolver>,
  ) -> Self {
    Self { remap, external, resolver }
  }
}

impl BundlerPlugin for RemapDependenciesPlugin {
  fn name(&self) -> &str {
    "remap-dependencies"
  }

  fn intercepted_specifiers(&self) -> Vec<String> {
    self.remap.keys().cloned().collect()
  }

  fn resolve_id(&self, specifier: &str) -> anyhow::Result<Option<ResolvedRedirect>> {
    let Some(remap) = self.remap.get(specifier) else {
      return Ok(None);
    };
    if self.external.contains(remap) {
      return Ok(Some(ResolvedRedirect { path: remap.clone(), external: true }));
    }
    let resolved = self
      .resolver
      .resolve(None, remap)
      .map_err(|err| anyhow::anyhow!("Failed to resolve {remap} (remapped from {specifier}): {err}"))?;
    Ok(Some(ResolvedRedirect { path: resolved.expect_to_slash(), external: false }))
  }
}
