mod downlevel;
mod remap_dependencies;

pub use self::{downlevel::DownlevelPlugin, remap_dependencies::RemapDependenciesPlugin};

/// Where a redirected import should be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRedirect {
  pub path: String,
  /// Left as an import in the output instead of being bundled.
  pub external: bool,
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
  pub code: String,
  pub map: Option<String>,
}

/// A hook the engine consults while bundling. The provided methods leave every
/// import and every module untouched.
pub trait BundlerPlugin: Send + Sync {
  fn name(&self) -> &str;

  /// Specifiers this plugin may redirect in [`BundlerPlugin::resolve_id`]. Engines
  /// without a resolve callback use this to set up aliases ahead of the build.
  fn intercepted_specifiers(&self) -> Vec<String> {
    Vec::new()
  }

  fn resolve_id(&self, _specifier: &str) -> anyhow::Result<Option<ResolvedRedirect>> {
    Ok(None)
  }

  fn transform(&self, _id: &str, _code: &str) -> anyhow::Result<Option<TransformOutput>> {
    Ok(None)
  }
}
