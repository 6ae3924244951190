use clap::ValueEnum;

#[derive(PartialEq, Eq, Clone, Copy, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum OutputFormat {
  Iife,
  Esm,
  Cjs,
}

impl From<OutputFormat> for amppack::OutputFormat {
  fn from(value: OutputFormat) -> Self {
    match value {
      OutputFormat::Iife => amppack::OutputFormat::Iife,
      OutputFormat::Esm => amppack::OutputFormat::Esm,
      OutputFormat::Cjs => amppack::OutputFormat::Cjs,
    }
  }
}
