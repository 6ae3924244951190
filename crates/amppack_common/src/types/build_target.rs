use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::TargetOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTarget {
  pub src_dir: PathBuf,
  pub src_filename: String,
  pub dest_dir: PathBuf,
  pub minified_dest_dir: PathBuf,
  #[serde(default)]
  pub options: TargetOptions,
}

impl BuildTarget {
  pub fn entry_point(&self) -> PathBuf {
    self.src_dir.join(&self.src_filename)
  }

  pub fn dest_dir_for(&self, minify: bool) -> &Path {
    if minify {
      &self.minified_dest_dir
    } else {
      &self.dest_dir
    }
  }
}
