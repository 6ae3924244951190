mod args;
mod types;

use std::time::Instant;

use ansi_term::Colour;
use args::{BuildArgs, InputArgs, PipelineArgs};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use amppack::{BuildState, FanOut, Pipeline, ProjectConfig, TargetOptions};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[clap(flatten)]
  input: InputArgs,

  #[clap(flatten)]
  build: BuildArgs,

  #[clap(flatten)]
  pipeline: PipelineArgs,
}

fn init_tracing() {
  let filter = EnvFilter::try_from_env("AMPPACK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).without_time().init();
}

fn overrides(args: &BuildArgs) -> TargetOptions {
  TargetOptions {
    minify: args.minify.then_some(true),
    watch: args.watch.then_some(true),
    output_format: args.format.map(Into::into),
    continue_on_error: args.continue_on_error.then_some(true),
    ..TargetOptions::default()
  }
}

fn pipeline_from_args(args: &Commands) -> anyhow::Result<(Pipeline, Vec<String>)> {
  let (registry, mut options) = ProjectConfig::load(&args.input.config)?.into_parts();
  let PipelineArgs {
    esm,
    full_sourcemaps,
    pretty_print,
    legacy,
    source_root,
    runtime_config,
    config_global,
    defines,
  } = &args.pipeline;
  if *esm {
    options.esm = Some(true);
  }
  if *full_sourcemaps {
    options.full_sourcemaps = Some(true);
  }
  if *pretty_print {
    options.pretty_print = Some(true);
  }
  if *legacy {
    options.use_legacy_optimizer = Some(true);
  }
  if source_root.is_some() {
    options.source_root.clone_from(source_root);
  }
  if runtime_config.is_some() {
    options.config.clone_from(runtime_config);
  }
  if config_global.is_some() {
    options.config_global.clone_from(config_global);
  }
  if !defines.is_empty() {
    options.defines.get_or_insert_with(Default::default).extend(defines.iter().cloned());
  }

  let targets = if args.input.targets.is_empty() {
    registry.names().map(ToString::to_string).collect()
  } else {
    args.input.targets.clone()
  };
  Ok((Pipeline::new(registry, options, BuildState::new().into())?, targets))
}

#[tokio::main]
async fn main() {
  init_tracing();
  let args = Commands::parse();

  let (pipeline, targets) = match pipeline_from_args(&args) {
    Ok(parts) => parts,
    Err(error) => {
      tracing::error!("{} {error:#}", Colour::Red.paint("Error:"));
      return;
    }
  };

  let fan_out = if args.build.fail_fast { FanOut::FailFast } else { FanOut::CollectAll };
  let start = Instant::now();
  match pipeline.build_many(&targets, &overrides(&args.build), fan_out).await {
    Ok(()) => {
      let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
      tracing::info!("{} Finished in {}", Colour::Green.paint("✔"), Colour::White.bold().paint(elapsed));
    }
    Err(errors) => {
      for error in &*errors {
        tracing::error!("{} {error:#}", Colour::Red.paint("Error:"));
      }
      let failed = errors.failed_outputs();
      if !failed.is_empty() {
        tracing::error!("{} {}", Colour::Red.paint("Failed outputs:"), failed.join(", "));
      }
    }
  }

  if args.build.watch && pipeline.state().watched_len() > 0 {
    tracing::info!("Watching {} entry points, press Ctrl-C to stop", pipeline.state().watched_len());
    if let Err(error) = tokio::signal::ctrl_c().await {
      tracing::error!("{} {error}", Colour::Red.paint("Error:"));
    }
  }
}
