use std::path::{Path, PathBuf};

use dashmap::DashMap;
use oxc_resolver::{ResolveError, ResolveOptions as OxcResolverOptions, ResolverGeneric};
use sugar_path::SugarPath;

type OxcResolver = oxc_resolver::Resolver;

#[derive(Debug)]
pub struct Resolver {
  cwd: PathBuf,
  inner: OxcResolver,
  resolved: DashMap<(PathBuf, String), PathBuf>,
}

impl Resolver {
  pub fn new(cwd: PathBuf) -> Self {
    let condition_names =
      ["import", "default", "browser"].into_iter().map(ToString::to_string).collect();

    let options = OxcResolverOptions {
      main_fields: vec!["browser".to_string(), "module".to_string(), "main".to_string()],
      alias_fields: vec![vec!["browser".to_string()]],
      condition_names,
      extensions: vec![String::from(".js"), String::from(".mjs"), String::from(".ts")],
      ..Default::default()
    };

    Self { cwd, inner: ResolverGeneric::new(options), resolved: DashMap::default() }
  }

  pub fn cwd(&self) -> &Path {
    &self.cwd
  }

  /// Resolves `specifier` from the directory of `importer`, or from the working
  /// directory when there is no importer. Bare specifiers that are not packages are
  /// retried as paths relative to the working directory.
  pub fn resolve(&self, importer: Option<&Path>, specifier: &str) -> Result<PathBuf, ResolveError> {
    let dir = importer
      .and_then(Path::parent)
      .filter(|inner| inner.components().next().is_some())
      .unwrap_or(self.cwd.as_path())
      .to_path_buf();

    let key = (dir, specifier.to_string());
    if let Some(resolved) = self.resolved.get(&key) {
      return Ok(resolved.clone());
    }

    let mut resolution = self.inner.resolve(&key.0, specifier);
    let is_specifier_path_like = specifier.starts_with('.') || specifier.starts_with('/');
    if resolution.is_err() && !is_specifier_path_like {
      let normalized_specifier = self.cwd.join(specifier).normalize();
      let result = self.inner.resolve(&key.0, &normalized_specifier.to_string_lossy());
      if result.is_ok() {
        resolution = result;
      }
    }

    let path = resolution?.full_path();
    self.resolved.insert(key, path.clone());
    Ok(path)
  }
}
