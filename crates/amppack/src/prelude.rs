use std::path::PathBuf;

use amppack_common::BundleOptions;
use anyhow::Context;
use async_trait::async_trait;

/// Build-time configuration text placed ahead of the wrapper banner.
#[async_trait]
pub trait ConfigPrelude: Send + Sync {
  async fn prelude(&self, dest_filename: &str, options: &BundleOptions) -> anyhow::Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrelude;

#[async_trait]
impl ConfigPrelude for NoPrelude {
  async fn prelude(&self, _dest_filename: &str, _options: &BundleOptions) -> anyhow::Result<String> {
    Ok(String::new())
  }
}

/// Assigns the contents of a JSON file to a global unless the page already set it.
#[derive(Debug, Clone)]
pub struct JsonConfigPrelude {
  path: PathBuf,
  global: String,
}

impl JsonConfigPrelude {
  pub fn new(path: PathBuf, global: impl Into<String>) -> Self {
    Self { path, global: global.into() }
  }
}

#[async_trait]
impl ConfigPrelude for JsonConfigPrelude {
  async fn prelude(&self, _dest_filename: &str, options: &BundleOptions) -> anyhow::Result<String> {
    // npm packages are configured by the embedding page.
    if options.npm {
      return Ok(String::new());
    }
    let source = tokio::fs::read_to_string(&self.path)
      .await
      .with_context(|| format!("Failed to read config {}", self.path.display()))?;
    let config: serde_json::Value = serde_json::from_str(&source)
      .with_context(|| format!("Failed to parse config {}", self.path.display()))?;
    let global = &self.global;
    Ok(format!("self.{global}||(self.{global}={config});/*{global}*/"))
  }
}
