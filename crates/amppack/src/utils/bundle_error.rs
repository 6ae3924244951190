use std::sync::LazyLock;

use amppack_error::PipelineError;
use regex::Regex;

static STACK_FRAMES: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?s) {4}at.*").expect("valid regex"));

/// Drops the call stack the bundler appends to its messages.
pub fn strip_stack_frames(message: &str) -> String {
  STACK_FRAMES.replace(message, "").trim().to_string()
}

/// Logs a failed compile. Returns `Ok` when the caller keeps going and
/// [`PipelineError::BundleFailed`] otherwise.
pub fn handle_bundle_error(
  error: &anyhow::Error,
  continue_on_error: bool,
  dest_filename: &str,
) -> anyhow::Result<()> {
  let message = strip_stack_frames(&format!("{error:#}"));
  tracing::error!("ERROR: {message}");
  if continue_on_error {
    tracing::error!("ERROR: Could not compile {dest_filename}");
    Ok(())
  } else {
    Err(PipelineError::BundleFailed { dest_filename: dest_filename.to_string(), message }.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_frames() {
    let message = "Build failed with 1 error:\nsrc/amp.js:1:4: ERROR: Unexpected \"=\"\n    at failureErrorWithLog (node_modules/esbuild/lib/main.js:1603:15)\n    at node:internal/process/task_queues:96:5";
    assert_eq!(
      strip_stack_frames(message),
      "Build failed with 1 error:\nsrc/amp.js:1:4: ERROR: Unexpected \"=\""
    );
    assert_eq!(strip_stack_frames("plain message"), "plain message");
  }

  #[test]
  fn fatal_unless_continuing() {
    let error = anyhow::anyhow!("boom\n    at main.js:1:1");
    assert!(handle_bundle_error(&error, true, "amp.js").is_ok());

    let fatal = handle_bundle_error(&error, false, "amp.js").unwrap_err();
    match fatal.downcast_ref::<PipelineError>() {
      Some(PipelineError::BundleFailed { dest_filename, message }) => {
        assert_eq!(dest_filename, "amp.js");
        assert_eq!(message, "boom");
      }
      other => panic!("unexpected error {other:?}"),
    }
  }
}
