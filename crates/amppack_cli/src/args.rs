use std::path::PathBuf;

use clap::Args;

use crate::types::output_format::OutputFormat;

#[derive(Args)]
pub struct InputArgs {
  /// Project file declaring the build targets.
  #[clap(long, short, default_value = "amppack.json")]
  pub config: PathBuf,

  /// Targets to build. Every target of the project file when omitted.
  #[clap(long = "target", short, action = clap::ArgAction::Append)]
  pub targets: Vec<String>,
}

#[derive(Args)]
pub struct BuildArgs {
  #[clap(long, short = 'm')]
  pub minify: bool,

  #[clap(long, short = 'w')]
  pub watch: bool,

  #[clap(long)]
  pub format: Option<OutputFormat>,

  /// Keep building the remaining targets when one fails.
  #[clap(long)]
  pub continue_on_error: bool,

  #[clap(long)]
  pub fail_fast: bool,
}

#[derive(Args)]
pub struct PipelineArgs {
  #[clap(long)]
  pub esm: bool,

  #[clap(long)]
  pub full_sourcemaps: bool,

  #[clap(long)]
  pub pretty_print: bool,

  /// Minify with the whole-program optimizer instead of the bundled compressor.
  #[clap(long)]
  pub legacy: bool,

  #[clap(long)]
  pub source_root: Option<String>,

  /// JSON file assigned to the config global ahead of every non-npm bundle.
  #[clap(long)]
  pub runtime_config: Option<PathBuf>,

  #[clap(long)]
  pub config_global: Option<String>,

  /// `NAME=VALUE` replacement applied to every bundle. Repeatable.
  #[clap(long = "define", value_parser = parse_define, action = clap::ArgAction::Append)]
  pub defines: Vec<(String, String)>,
}

fn parse_define(raw: &str) -> Result<(String, String), String> {
  match raw.split_once('=') {
    Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
    _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
  }
}

#[test]
fn defines_split_on_the_first_equals_sign() {
  assert_eq!(parse_define("IS_PROD=true"), Ok(("IS_PROD".to_string(), "true".to_string())));
  assert_eq!(parse_define("MODE=a=b"), Ok(("MODE".to_string(), "a=b".to_string())));
  assert!(parse_define("IS_PROD").is_err());
  assert!(parse_define("=true").is_err());
}
