use std::{
  path::{Path, PathBuf},
  sync::atomic::{AtomicUsize, Ordering},
};

use amppack_common::{CompiledArtifact, NormalizedPipelineOptions};
use anyhow::Context;

static NEXT_TEMP_ID: AtomicUsize = AtomicUsize::new(0);

/// `dist/amp.js` -> `dist/amp.js.map`
pub fn map_path_of(dest_file: &Path) -> PathBuf {
  let mut path = dest_file.as_os_str().to_owned();
  path.push(".map");
  PathBuf::from(path)
}

fn temp_path_of(path: &Path) -> PathBuf {
  let id = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
  let mut temp = path.as_os_str().to_owned();
  temp.push(format!(".{}-{id}.tmp", std::process::id()));
  PathBuf::from(temp)
}

/// Writes `<dest_file>` and `<dest_file>.map`. Both are staged next to their
/// destination first, so a failure leaves the previous pair in place.
pub async fn write_output_pair(dest_file: &Path, artifact: &CompiledArtifact) -> anyhow::Result<()> {
  if let Some(parent) = dest_file.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("Failed to create {}", parent.display()))?;
  }

  let map_file = map_path_of(dest_file);
  let code_temp = temp_path_of(dest_file);
  let map_temp = temp_path_of(&map_file);

  let staged = async {
    tokio::fs::write(&code_temp, &artifact.code).await?;
    tokio::fs::write(&map_temp, &artifact.map).await?;
    tokio::fs::rename(&map_temp, &map_file).await?;
    tokio::fs::rename(&code_temp, dest_file).await
  }
  .await;

  if let Err(err) = staged {
    let _ = tokio::fs::remove_file(&code_temp).await;
    let _ = tokio::fs::remove_file(&map_temp).await;
    return Err(err).with_context(|| format!("Failed to write {}", dest_file.display()));
  }
  Ok(())
}

/// Contents of the pre-built files that run inside the wrapper of `src_filename`,
/// joined with newlines. Empty when there are none.
pub async fn read_auxiliary_content(
  options: &NormalizedPipelineOptions,
  src_filename: &str,
) -> anyhow::Result<String> {
  let Some(files) = options.auxiliary_bundle(src_filename) else {
    return Ok(String::new());
  };
  let contents = futures::future::try_join_all(files.iter().map(|file| async move {
    let path = options.cwd.join(file);
    tokio::fs::read_to_string(&path)
      .await
      .with_context(|| format!("Failed to read {}", path.display()))
  }))
  .await?;
  Ok(contents.join("\n"))
}
